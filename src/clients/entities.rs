use std::fmt;
use std::path::{Path, PathBuf};

/// A track from an artist's top tracks list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// 1-based position in the popularity list
    pub rank: u32,
    pub playcount: Option<u64>,
}

impl Track {
    pub fn new(title: impl Into<String>, rank: u32) -> Self {
        Track {
            title: title.into(),
            rank,
            playcount: None,
        }
    }
}

/// A song entry on the media platform matched to a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// Duration as shown by the platform, e.g. "3:45"
    pub duration: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl SearchResult {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Downloaded(PathBuf),
    Failed(String),
}

/// Result of processing a single track
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub track: Track,
    pub matched: Option<SearchResult>,
    pub status: OutcomeStatus,
}

impl DownloadOutcome {
    pub fn downloaded(track: Track, matched: SearchResult, path: PathBuf) -> Self {
        DownloadOutcome {
            track,
            matched: Some(matched),
            status: OutcomeStatus::Downloaded(path),
        }
    }

    pub fn failed(track: Track, matched: Option<SearchResult>, reason: impl Into<String>) -> Self {
        DownloadOutcome {
            track,
            matched,
            status: OutcomeStatus::Failed(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Downloaded(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Failed(reason) => Some(reason),
            OutcomeStatus::Downloaded(_) => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.status {
            OutcomeStatus::Downloaded(path) => Some(path),
            OutcomeStatus::Failed(_) => None,
        }
    }
}

/// Outcomes of a whole run, in rank order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub artist: String,
    pub outcomes: Vec<DownloadOutcome>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let total = self.outcomes.len();
        let found = self.outcomes.iter().filter(|o| o.matched.is_some()).count();
        let downloaded = self.outcomes.iter().filter(|o| o.is_success()).count();
        RunSummary {
            total,
            found,
            downloaded,
            failed: total - downloaded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub found: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, found: {}, downloaded: {}, failed: {}",
            self.total, self.found, self.downloaded, self.failed
        )
    }
}
