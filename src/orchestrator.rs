use log::{debug, info, warn};

use crate::clients::{
    Downloader, LastFmClient, MetadataProvider, SearchResolver, YtDlp, YtMusicClient,
    entities::{DownloadOutcome, RunReport, Track},
    errors::{Error, Result},
    lastfm::MAX_LIMIT,
};
use crate::config::Config;

/// Runs fetch -> search -> download one track at a time.
///
/// A failing track is recorded in the report and the run moves on.
pub struct Orchestrator {
    provider: Box<dyn MetadataProvider>,
    resolver: Box<dyn SearchResolver>,
    downloader: Box<dyn Downloader>,
}

impl Orchestrator {
    pub fn new(
        provider: Box<dyn MetadataProvider>,
        resolver: Box<dyn SearchResolver>,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        Orchestrator {
            provider,
            resolver,
            downloader,
        }
    }

    /// Wire up the Last.fm, YouTube Music and yt-dlp clients
    pub fn try_from_config(config: &Config) -> Result<Self> {
        let downloader = YtDlp::new(&config.download_dir)
            .binary(&config.ytdlp_path)
            .audio_format(&config.audio_format)
            .audio_quality(&config.audio_quality)
            .cookie_file(config.cookie_file.clone());

        Ok(Orchestrator::new(
            Box::new(LastFmClient::new(&config.lastfm_api_key)),
            Box::new(YtMusicClient::new()?),
            Box::new(downloader),
        ))
    }

    /// Fail early when the downloader can't run at all
    pub async fn preflight(&self) -> Result<()> {
        self.downloader.check_available().await
    }

    pub async fn top_tracks(&self, artist: &str, limit: u32) -> Result<Vec<Track>> {
        let artist = artist.trim();
        if artist.is_empty() {
            return Err(Error::InvalidInput("Artist name cannot be empty".to_string()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "track limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        self.provider.top_tracks(artist, limit).await
    }

    pub async fn run(&self, artist: &str, limit: u32) -> Result<RunReport> {
        let artist = artist.trim();
        info!("Starting download process for artist: {artist} (limit: {limit})");

        let tracks = self.top_tracks(artist, limit).await?;
        info!("Found {} tracks for {artist}", tracks.len());

        let total = tracks.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, track) in tracks.into_iter().enumerate() {
            info!("Processing track {}/{total}: {}", i + 1, track.title);
            let outcome = self.process_track(artist, track).await;
            match outcome.error() {
                None => info!("Successfully downloaded: {}", outcome.track.title),
                Some(reason) => warn!("Failed to download {}: {reason}", outcome.track.title),
            }
            outcomes.push(outcome);
        }

        let report = RunReport {
            artist: artist.to_string(),
            outcomes,
        };
        info!("Download completed. Stats: {}", report.summary());
        Ok(report)
    }

    // Errors stop here and become a failed outcome
    async fn process_track(&self, artist: &str, track: Track) -> DownloadOutcome {
        debug!("Searching for: {artist} - {}", track.title);
        let song = match self.resolver.resolve(artist, &track).await {
            Ok(Some(song)) => song,
            Ok(None) => {
                let reason = Error::NoSearchMatch(format!("{artist} - {}", track.title));
                return DownloadOutcome::failed(track, None, reason.to_string());
            }
            Err(e) => return DownloadOutcome::failed(track, None, e.to_string()),
        };

        let subdir = song.primary_artist().unwrap_or(artist).to_string();
        match self.downloader.download(&song, &subdir).await {
            Ok(path) => {
                debug!("Output file: {}", path.display());
                DownloadOutcome::downloaded(track, song, path)
            }
            Err(e) => DownloadOutcome::failed(track, Some(song), e.to_string()),
        }
    }
}
