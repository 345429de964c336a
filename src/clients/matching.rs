use crate::clients::entities::SearchResult;

/// Lowercase and keep alphanumerics only, so "AC/DC" and "acdc" compare equal
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn artist_matches(result: &SearchResult, artist: &str) -> bool {
    let wanted = normalize(artist);
    !wanted.is_empty() && result.artists.iter().any(|a| normalize(a) == wanted)
}

fn title_matches(result: &SearchResult, title: &str) -> bool {
    let wanted = normalize(title);
    !wanted.is_empty() && normalize(&result.title).contains(&wanted)
}

/// Pick the search match for a track.
///
/// Preference order, keeping the platform's ranking within each tier:
/// artist and title both match, then artist only, then the top result.
pub fn select_best_match<'a>(
    results: &'a [SearchResult],
    artist: &str,
    title: &str,
) -> Option<&'a SearchResult> {
    results
        .iter()
        .find(|r| artist_matches(r, artist) && title_matches(r, title))
        .or_else(|| results.iter().find(|r| artist_matches(r, artist)))
        .or_else(|| results.first())
}
