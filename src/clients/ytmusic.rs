use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{Value, json};

use crate::clients::{
    SearchResolver,
    entities::{SearchResult, Track},
    errors::{Error, Result},
    matching::select_best_match,
};

/// Web client search endpoint of YouTube Music
pub const SEARCH_ENDPOINT: &str = "https://music.youtube.com/youtubei/v1/search";

// Restricts results to the "Songs" shelf
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";
const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20241023.01.00";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const ORIGIN: &str = "https://music.youtube.com";

pub struct YtMusicClient {
    http: reqwest::Client,
    endpoint: String,
}

impl YtMusicClient {
    pub fn new() -> Result<Self> {
        YtMusicClient::with_endpoint(SEARCH_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(YtMusicClient {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Search the songs shelf, keeping the platform's ordering
    pub async fn search_songs(&self, query: &str) -> Result<Vec<SearchResult>> {
        debug!("Searching YouTube Music for: {query}");
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("alt", "json")])
            .header(reqwest::header::ORIGIN, ORIGIN)
            .header(reqwest::header::REFERER, format!("{ORIGIN}/"))
            .json(&search_body(query))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_search_response(&body)
    }
}

#[async_trait]
impl SearchResolver for YtMusicClient {
    async fn resolve(&self, artist: &str, track: &Track) -> Result<Option<SearchResult>> {
        let query = format!("{artist} - {}", track.title);
        let results = self.search_songs(&query).await?;
        if results.is_empty() {
            warn!("No results found for: {query}");
            return Ok(None);
        }

        let best = select_best_match(&results, artist, &track.title).cloned();
        if let Some(song) = &best {
            debug!("Found song: {} by {:?}", song.title, song.artists);
        }
        Ok(best)
    }
}

fn search_body(query: &str) -> Value {
    json!({
        "context": {
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en",
                "gl": "US"
            }
        },
        "query": query,
        "params": SONGS_FILTER_PARAMS
    })
}

fn parse_search_response(body: &Value) -> Result<Vec<SearchResult>> {
    let Some(contents) = body.get("contents") else {
        return Ok(Vec::new());
    };

    // Filtered searches drop the tab wrapper and return the section list directly
    let section_list = contents
        .pointer("/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer")
        .or_else(|| contents.get("sectionListRenderer"))
        .ok_or_else(|| {
            Error::YtMusicUnexpectedResponse("no sectionListRenderer in search contents".to_string())
        })?;

    let sections = section_list
        .get("contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // A search without hits has no musicShelfRenderer at all
    let results = sections
        .iter()
        .filter_map(|section| section.pointer("/musicShelfRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.get("musicResponsiveListItemRenderer"))
        .filter_map(parse_song_item)
        .collect();

    Ok(results)
}

fn flex_column_runs(item: &Value, column: usize) -> &[Value] {
    item.get("flexColumns")
        .and_then(|cols| cols.get(column))
        .and_then(|col| col.pointer("/musicResponsiveListItemFlexColumnRenderer/text/runs"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn video_id(item: &Value, title_runs: &[Value]) -> Option<String> {
    item.pointer("/playlistItemData/videoId")
        .or_else(|| {
            item.pointer(
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
        .or_else(|| {
            title_runs
                .first()
                .and_then(|run| run.pointer("/navigationEndpoint/watchEndpoint/videoId"))
        })
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn parse_song_item(item: &Value) -> Option<SearchResult> {
    let title_runs = flex_column_runs(item, 0);
    let title = title_runs
        .first()
        .and_then(|run| run.get("text"))
        .and_then(Value::as_str)?
        .to_string();
    let video_id = video_id(item, title_runs)?;

    let mut artists = Vec::new();
    let mut album = None;
    let mut duration = None;

    for run in flex_column_runs(item, 1) {
        let Some(text) = run.get("text").and_then(Value::as_str) else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() || text == "•" || text == "&" || text == "," {
            continue;
        }

        match run.pointer("/navigationEndpoint/browseEndpoint/browseId").and_then(Value::as_str) {
            Some(id) if id.starts_with("MPRE") => album = Some(text.to_string()),
            Some(_) => artists.push(text.to_string()),
            None if parse_duration(text).is_some() => duration = Some(text.to_string()),
            // Artists without a channel come through as plain text
            None if album.is_none() && !matches!(text, "Song" | "Video") => {
                artists.push(text.to_string());
            }
            None => {}
        }
    }

    let duration_seconds = duration.as_deref().and_then(parse_duration);
    Some(SearchResult {
        video_id,
        title,
        artists,
        album,
        duration,
        duration_seconds,
    })
}

/// Parse "m:ss" or "h:mm:ss" into seconds
pub fn parse_duration(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    parts.iter().try_fold(0u32, |acc, part| {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().ok()?;
        acc.checked_mul(60)?.checked_add(value)
    })
}
