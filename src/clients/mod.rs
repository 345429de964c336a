use async_trait::async_trait;
use std::path::PathBuf;

/// Data entities for tracks, search results and download outcomes
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Last.fm API client
pub mod lastfm;
/// Search result selection
pub mod matching;
/// `yt-dlp` audio downloader
pub mod ytdlp;
/// YouTube Music search client
pub mod ytmusic;

pub use lastfm::LastFmClient;
pub use ytdlp::YtDlp;
pub use ytmusic::YtMusicClient;

use entities::{SearchResult, Track};
use errors::Result;

/// Source of an artist's ranked top tracks
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// At most `limit` tracks sorted by rank, rank 1 first.
    /// An artist with no tracks is `Error::NoTracksFound`.
    async fn top_tracks(&self, artist: &str, limit: u32) -> Result<Vec<Track>>;
}

/// Resolves a track to a song on the media platform
#[async_trait]
pub trait SearchResolver: Send + Sync {
    /// `Ok(None)` means the search ran but nothing matched
    async fn resolve(&self, artist: &str, track: &Track) -> Result<Option<SearchResult>>;
}

/// Fetches the audio of a resolved song to local storage
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Check that the downloader can run on this system
    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Download into `output_subdir` below the base directory, returning the file path
    async fn download(&self, song: &SearchResult, output_subdir: &str) -> Result<PathBuf>;
}
