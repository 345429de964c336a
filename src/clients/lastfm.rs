use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::clients::{
    MetadataProvider,
    entities::Track,
    errors::{Error, Result},
};

/// Default Last.fm REST endpoint
pub const API_ROOT: &str = "http://ws.audioscrobbler.com/2.0/";
/// Largest page size accepted by `artist.gettoptracks`
pub const MAX_LIMIT: u32 = 1000;

#[derive(Deserialize, Debug)]
struct ApiError {
    error: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct RankAttr {
    rank: String,
}

#[derive(Deserialize, Debug)]
struct LastFMAPITrack {
    name: String,
    playcount: Option<String>,
    #[serde(rename = "@attr")]
    attr: Option<RankAttr>,
}

// Last.fm collapses a one-element list into a bare object
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize, Debug)]
struct TopTracks {
    track: Option<OneOrMany<LastFMAPITrack>>,
}

#[derive(Deserialize, Debug)]
struct TopTracksResponse {
    toptracks: Option<TopTracks>,
}

pub struct LastFmClient {
    http: reqwest::Client,
    api_key: String,
    api_root: String,
}

impl LastFmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        LastFmClient::with_api_root(api_key, API_ROOT)
    }

    pub fn with_api_root(api_key: impl Into<String>, api_root: impl Into<String>) -> Self {
        LastFmClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            api_root: api_root.into(),
        }
    }

    fn query_params(&self, artist: &str, limit: u32) -> Vec<(&'static str, String)> {
        vec![
            ("method", "artist.gettoptracks".to_string()),
            ("artist", artist.to_string()),
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("limit", limit.to_string()),
        ]
    }

    pub async fn get_top_tracks(&self, artist: &str, limit: u32) -> Result<Vec<Track>> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "track limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }

        debug!("Fetching top {limit} tracks for artist: {artist}");
        let response = self
            .http
            .get(&self.api_root)
            .query(&self.query_params(artist, limit))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let tracks = parse_body(status, &body, artist, limit)?;
        debug!("Found {} tracks for {artist}", tracks.len());
        Ok(tracks)
    }
}

#[async_trait]
impl MetadataProvider for LastFmClient {
    async fn top_tracks(&self, artist: &str, limit: u32) -> Result<Vec<Track>> {
        self.get_top_tracks(artist, limit).await
    }
}

// Proxies and outages answer with HTML, so JSON is only required on success
fn parse_body(status: StatusCode, body: &str, artist: &str, limit: u32) -> Result<Vec<Track>> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => parse_top_tracks(status, value, artist, limit),
        Err(_) if !status.is_success() => Err(Error::LastFMUnexpectedResponse(format!(
            "HTTP {status} for artist {artist}"
        ))),
        Err(e) => Err(Error::DeserializationError(e)),
    }
}

fn parse_top_tracks(status: StatusCode, body: Value, artist: &str, limit: u32) -> Result<Vec<Track>> {
    // Error bodies come with both 200 and 4xx statuses
    if body.get("error").is_some() {
        let err: ApiError = serde_json::from_value(body)?;
        return Err(Error::LastFMApiError {
            code: err.error,
            message: err.message,
        });
    }
    if !status.is_success() {
        return Err(Error::LastFMUnexpectedResponse(format!(
            "HTTP {status} for artist {artist}"
        )));
    }

    let response: TopTracksResponse = serde_json::from_value(body)?;
    let api_tracks = response
        .toptracks
        .and_then(|t| t.track)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    if api_tracks.is_empty() {
        return Err(Error::NoTracksFound(artist.to_string()));
    }

    let mut tracks: Vec<Track> = api_tracks
        .into_iter()
        .zip(1u32..)
        .map(|(t, position)| Track {
            rank: t
                .attr
                .and_then(|a| a.rank.parse().ok())
                .unwrap_or(position),
            playcount: t.playcount.and_then(|p| p.parse().ok()),
            title: t.name,
        })
        .collect();

    tracks.sort_by_key(|t| t.rank);
    tracks.truncate(limit as usize);
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn api_track(name: &str, rank: &str) -> Value {
        json!({
            "name": name,
            "playcount": "1200",
            "listeners": "300",
            "url": format!("https://www.last.fm/music/Camellia/_/{name}"),
            "@attr": { "rank": rank }
        })
    }

    #[test]
    fn test_tracks_are_ordered_by_rank() {
        let body = json!({
            "toptracks": {
                "track": [api_track("Second", "2"), api_track("First", "1"), api_track("Third", "3")],
                "@attr": { "artist": "Camellia", "page": "1" }
            }
        });

        let tracks = parse_top_tracks(StatusCode::OK, body, "Camellia", 50).unwrap();
        let titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert_eq!(tracks[0].rank, 1);
        assert_eq!(tracks[0].playcount, Some(1200));
    }

    #[test]
    fn test_missing_rank_falls_back_to_position() {
        let body = json!({
            "toptracks": { "track": [{ "name": "A" }, { "name": "B" }] }
        });

        let tracks = parse_top_tracks(StatusCode::OK, body, "Artist", 50).unwrap();
        assert_eq!(tracks, vec![Track::new("A", 1), Track::new("B", 2)]);
    }

    #[test]
    fn test_single_track_object_is_accepted() {
        let body = json!({ "toptracks": { "track": api_track("Only", "1") } });

        let tracks = parse_top_tracks(StatusCode::OK, body, "Artist", 50).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Only");
    }

    #[test]
    fn test_result_is_truncated_to_limit() {
        let body = json!({
            "toptracks": { "track": [api_track("A", "1"), api_track("B", "2"), api_track("C", "3")] }
        });

        let tracks = parse_top_tracks(StatusCode::OK, body, "Artist", 2).unwrap();
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn test_api_error_body() {
        let body = json!({
            "error": 6,
            "message": "The artist you supplied could not be found",
            "links": []
        });

        let err = parse_top_tracks(StatusCode::OK, body, "Nobody", 50).unwrap_err();
        assert_matches!(err, Error::LastFMApiError { code: 6, ref message } if message.contains("could not be found"));
    }

    #[test]
    fn test_api_error_body_with_error_status() {
        let body = json!({ "error": 10, "message": "Invalid API key" });

        let err = parse_top_tracks(StatusCode::FORBIDDEN, body, "Artist", 50).unwrap_err();
        assert_matches!(err, Error::LastFMApiError { code: 10, .. });
    }

    #[test]
    fn test_error_status_without_error_body() {
        let err = parse_top_tracks(StatusCode::BAD_GATEWAY, json!({}), "Artist", 50).unwrap_err();
        assert_matches!(err, Error::LastFMUnexpectedResponse(_));
    }

    #[test]
    fn test_error_status_with_html_body() {
        let err = parse_body(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>", "Artist", 50)
            .unwrap_err();
        assert_matches!(err, Error::LastFMUnexpectedResponse(ref msg) if msg.contains("502"));
    }

    #[test]
    fn test_json_error_body_inside_text_response() {
        let err = parse_body(
            StatusCode::FORBIDDEN,
            r#"{"error": 10, "message": "Invalid API key"}"#,
            "Artist",
            50,
        )
        .unwrap_err();
        assert_matches!(err, Error::LastFMApiError { code: 10, .. });

        let tracks = parse_body(
            StatusCode::OK,
            r#"{"toptracks": {"track": [{"name": "A", "@attr": {"rank": "1"}}]}}"#,
            "Artist",
            50,
        )
        .unwrap();
        assert_eq!(tracks, vec![Track::new("A", 1)]);
    }

    #[test]
    fn test_success_status_with_non_json_body() {
        let err = parse_body(StatusCode::OK, "<html>maintenance</html>", "Artist", 50).unwrap_err();
        assert_matches!(err, Error::DeserializationError(_));
    }

    #[tokio::test]
    async fn test_html_error_page_from_server() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let body = "<html>Bad Gateway</html>";
            let reply = format!(
                "HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });

        let client = LastFmClient::with_api_root("secret", format!("http://{addr}/2.0/"));
        let err = client.get_top_tracks("Artist", 50).await.unwrap_err();
        assert_matches!(err, Error::LastFMUnexpectedResponse(_));
        server.await.unwrap();
    }

    #[test]
    fn test_missing_tracks() {
        let err = parse_top_tracks(StatusCode::OK, json!({ "toptracks": {} }), "Artist", 50).unwrap_err();
        assert_matches!(err, Error::NoTracksFound(ref a) if a == "Artist");

        let err = parse_top_tracks(StatusCode::OK, json!({ "toptracks": { "track": [] } }), "Artist", 50)
            .unwrap_err();
        assert_matches!(err, Error::NoTracksFound(_));

        let err = parse_top_tracks(StatusCode::OK, json!({ "similar": 1 }), "Artist", 50).unwrap_err();
        assert_matches!(err, Error::NoTracksFound(_));
    }

    #[test]
    fn test_query_params() {
        let client = LastFmClient::new("secret");
        let params = client.query_params("Camellia", 1000);
        assert!(params.contains(&("method", "artist.gettoptracks".to_string())));
        assert!(params.contains(&("artist", "Camellia".to_string())));
        assert!(params.contains(&("api_key", "secret".to_string())));
        assert!(params.contains(&("format", "json".to_string())));
        assert!(params.contains(&("limit", "1000".to_string())));
    }

    #[tokio::test]
    async fn test_limit_out_of_range_is_rejected_before_request() {
        let client = LastFmClient::with_api_root("secret", "http://127.0.0.1:9/");
        let err = client.get_top_tracks("Artist", 0).await.unwrap_err();
        assert_matches!(err, Error::InvalidInput(_));

        let err = client.get_top_tracks("Artist", MAX_LIMIT + 1).await.unwrap_err();
        assert_matches!(err, Error::InvalidInput(_));
    }
}
