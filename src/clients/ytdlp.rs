use async_trait::async_trait;
use log::{debug, info};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

use crate::clients::{
    Downloader,
    entities::SearchResult,
    errors::{Error, Result},
};

const WATCH_URL: &str = "https://music.youtube.com/watch";

/// Audio downloader backed by the `yt-dlp` executable
pub struct YtDlp {
    binary: PathBuf,
    output_dir: PathBuf,
    audio_format: String,
    audio_quality: String,
    cookie_file: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        YtDlp {
            binary: PathBuf::from("yt-dlp"),
            output_dir: output_dir.into(),
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
            cookie_file: None,
        }
    }

    #[must_use]
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    #[must_use]
    pub fn audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }

    #[must_use]
    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = quality.into();
        self
    }

    #[must_use]
    pub fn cookie_file(mut self, cookie_file: Option<PathBuf>) -> Self {
        self.cookie_file = cookie_file;
        self
    }

    /// Directory a song lands in, one level below the base output directory
    pub fn target_dir(&self, output_subdir: &str) -> PathBuf {
        let subdir = sanitize_filename::sanitize(output_subdir);
        if subdir.trim().is_empty() {
            self.output_dir.clone()
        } else {
            self.output_dir.join(subdir)
        }
    }

    fn build_args(&self, url: &Url, target_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--format",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            self.audio_format.as_str(),
            "--audio-quality",
            self.audio_quality.as_str(),
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "--no-simulate",
            "--print",
            "after_move:filepath",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push("--output".into());
        args.push(target_dir.join("%(title)s.%(ext)s").into_os_string());

        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".into());
            args.push(cookie_file.clone().into_os_string());
        }

        args.push(url.as_str().into());
        args
    }
}

pub fn watch_url(video_id: &str) -> Result<Url> {
    if video_id.trim().is_empty() {
        return Err(Error::InvalidInput("No video ID provided for download".to_string()));
    }
    Url::parse_with_params(WATCH_URL, &[("v", video_id)])
        .map_err(|e| Error::InvalidInput(format!("invalid video ID {video_id}: {e}")))
}

/// The printed filepath is the last non-empty stdout line
fn parse_output_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

#[async_trait]
impl Downloader for YtDlp {
    async fn check_available(&self) -> Result<()> {
        which::which(&self.binary)
            .map(|path| debug!("Using yt-dlp at {}", path.display()))
            .map_err(|e| Error::YtDlpNotFound(format!("{}: {e}", self.binary.display())))
    }

    async fn download(&self, song: &SearchResult, output_subdir: &str) -> Result<PathBuf> {
        let url = watch_url(&song.video_id)?;
        let target_dir = self.target_dir(output_subdir);
        tokio::fs::create_dir_all(&target_dir).await?;

        info!("Downloading from: {url}");
        debug!("Output directory: {}", target_dir.display());

        let output = Command::new(&self.binary)
            .args(self.build_args(&url, &target_dir))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::DownloadFailed(format!(
                "yt-dlp exited with {} for {}: {}",
                output.status,
                song.video_id,
                stderr.trim()
            )));
        }

        parse_output_path(&output.stdout).ok_or_else(|| {
            Error::DownloadFailed(format!("yt-dlp reported no output file for {}", song.video_id))
        })
    }
}
