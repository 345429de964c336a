//! Runtime configuration assembled from the environment, an env file and CLI overrides.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::clients::errors::{Error, Result};

pub const LAST_FM_KEY: &str = "LAST_FM_KEY";
/// Alternative spelling accepted for the Last.fm key
pub const LASTFM_API_KEY: &str = "LASTFM_API_KEY";
pub const DOWNLOAD_DIR: &str = "DOWNLOAD_DIR";
pub const AUDIO_FORMAT: &str = "AUDIO_FORMAT";
pub const AUDIO_QUALITY: &str = "AUDIO_QUALITY";
pub const COOKIE_FILE: &str = "COOKIE_FILE";
pub const YTDLP_PATH: &str = "YTDLP_PATH";
pub const LOG_FILE: &str = "ARTISTDL_LOG_FILE";

const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_COOKIE_FILE: &str = "cookies.txt";
const DEFAULT_AUDIO_FORMAT: &str = "mp3";
const DEFAULT_AUDIO_QUALITY: &str = "192";

/// Codecs `yt-dlp --audio-format` can convert to
pub const AUDIO_FORMATS: &[&str] = &["mp3", "m4a", "aac", "flac", "opus", "vorbis", "wav", "alac"];

#[derive(Debug, Clone)]
pub struct Config {
    pub lastfm_api_key: String,
    pub download_dir: PathBuf,
    pub audio_format: String,
    pub audio_quality: String,
    pub cookie_file: Option<PathBuf>,
    pub ytdlp_path: PathBuf,
    pub log_file: PathBuf,
}

/// Default log location in the user cache directory
pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
        .join("artistdl")
        .join("artistdl.log")
}

/// Read key-value pairs from an env file without touching the process environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    debug!("Read {} entries from {}", vars.len(), path.display());
    Ok(vars)
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    lastfm_api_key: Option<String>,
    download_dir: Option<PathBuf>,
    audio_format: Option<String>,
    audio_quality: Option<String>,
    cookie_file: Option<PathBuf>,
    ytdlp_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from env-style keys; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            lastfm_api_key: get(LAST_FM_KEY).or_else(|| get(LASTFM_API_KEY)),
            download_dir: get(DOWNLOAD_DIR).map(PathBuf::from),
            audio_format: get(AUDIO_FORMAT),
            audio_quality: get(AUDIO_QUALITY),
            cookie_file: get(COOKIE_FILE).map(PathBuf::from),
            ytdlp_path: get(YTDLP_PATH).map(PathBuf::from),
            log_file: get(LOG_FILE).map(PathBuf::from),
        }
    }

    /// Process environment first, then `env_file` (or `./.env` when present)
    pub fn from_env(env_file: Option<&Path>) -> Result<Self> {
        Self::from_env_with(env_file, |key| std::env::var(key).ok())
    }

    fn from_env_with(
        env_file: Option<&Path>,
        process_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => match read_env_file(Path::new(".env")) {
                Ok(vars) => vars,
                Err(Error::EnvFileError(e)) if e.not_found() => HashMap::new(),
                Err(e) => return Err(e),
            },
        };
        Ok(Self::from_lookup(|key| {
            process_env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_vars.get(key).cloned())
        }))
    }

    #[must_use]
    pub fn lastfm_api_key(mut self, key: impl Into<String>) -> Self {
        self.lastfm_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = Some(quality.into());
        self
    }

    #[must_use]
    pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Log file location, usable before the rest of the config is validated
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(default_log_file)
    }

    pub fn build(self) -> Result<Config> {
        let lastfm_api_key = self
            .lastfm_api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::ConfigurationError(format!(
                    "{LAST_FM_KEY} not found in environment variables or env file"
                ))
            })?;

        let audio_format = self
            .audio_format
            .map(|f| f.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string());
        if !AUDIO_FORMATS.contains(&audio_format.as_str()) {
            return Err(Error::ConfigurationError(format!(
                "unsupported audio format {audio_format:?}, expected one of {}",
                AUDIO_FORMATS.join(", ")
            )));
        }

        let audio_quality = self
            .audio_quality
            .unwrap_or_else(|| DEFAULT_AUDIO_QUALITY.to_string());
        if !is_valid_quality(&audio_quality) {
            return Err(Error::ConfigurationError(format!(
                "invalid audio quality {audio_quality:?}, expected 0-10 or a bitrate such as 192K"
            )));
        }

        // An explicit cookie file must exist; the default one is optional
        let cookie_file = match self.cookie_file {
            Some(path) if path.is_file() => Some(path),
            Some(path) => {
                return Err(Error::ConfigurationError(format!(
                    "cookie file {} does not exist",
                    path.display()
                )));
            }
            None => Some(PathBuf::from(DEFAULT_COOKIE_FILE)).filter(|p| p.is_file()),
        };

        Ok(Config {
            lastfm_api_key,
            download_dir: self
                .download_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            audio_format,
            audio_quality,
            cookie_file,
            ytdlp_path: self.ytdlp_path.unwrap_or_else(|| PathBuf::from("yt-dlp")),
            log_file: self.log_file.unwrap_or_else(default_log_file),
        })
    }
}

fn is_valid_quality(quality: &str) -> bool {
    let digits = quality
        .strip_suffix(['K', 'k'])
        .unwrap_or(quality);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // Bare numbers up to 10 are VBR levels, bitrates start at 32
    digits.parse::<u32>().is_ok_and(|n| n <= 10 || n >= 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = ConfigBuilder::from_lookup(lookup(&[])).build().unwrap_err();
        assert_matches!(err, Error::ConfigurationError(ref msg) if msg.contains(LAST_FM_KEY));

        let err = ConfigBuilder::from_lookup(lookup(&[(LAST_FM_KEY, "  ")]))
            .build()
            .unwrap_err();
        assert_matches!(err, Error::ConfigurationError(_));
    }

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::from_lookup(lookup(&[(LAST_FM_KEY, "key")]))
            .build()
            .unwrap();

        assert_eq!(config.lastfm_api_key, "key");
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.audio_quality, "192");
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.log_file, default_log_file());
    }

    #[test]
    fn test_alias_key_and_env_values() {
        let config = ConfigBuilder::from_lookup(lookup(&[
            (LASTFM_API_KEY, "alias"),
            (DOWNLOAD_DIR, "/srv/music"),
            (AUDIO_FORMAT, "FLAC"),
            (AUDIO_QUALITY, "0"),
            (YTDLP_PATH, "/opt/yt-dlp"),
            (LOG_FILE, "/var/log/artistdl.log"),
        ]))
        .build()
        .unwrap();

        assert_eq!(config.lastfm_api_key, "alias");
        assert_eq!(config.download_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.audio_format, "flac");
        assert_eq!(config.audio_quality, "0");
        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(config.log_file, PathBuf::from("/var/log/artistdl.log"));
    }

    #[test]
    fn test_overrides_win_over_env_values() {
        let config = ConfigBuilder::from_lookup(lookup(&[(LAST_FM_KEY, "env"), (DOWNLOAD_DIR, "env-dir")]))
            .lastfm_api_key("cli")
            .download_dir("cli-dir")
            .audio_format("opus")
            .build()
            .unwrap();

        assert_eq!(config.lastfm_api_key, "cli");
        assert_eq!(config.download_dir, PathBuf::from("cli-dir"));
        assert_eq!(config.audio_format, "opus");
    }

    #[test]
    fn test_invalid_format_and_quality() {
        let err = ConfigBuilder::new()
            .lastfm_api_key("key")
            .audio_format("mp4")
            .build()
            .unwrap_err();
        assert_matches!(err, Error::ConfigurationError(ref msg) if msg.contains("mp4"));

        let err = ConfigBuilder::new()
            .lastfm_api_key("key")
            .audio_quality("loud")
            .build()
            .unwrap_err();
        assert_matches!(err, Error::ConfigurationError(_));
    }

    #[test]
    fn test_quality_values() {
        for ok in ["0", "5", "10", "128", "192K", "320k"] {
            assert!(is_valid_quality(ok), "{ok} should be accepted");
        }
        for bad in ["", "K", "11", "-1", "192kbps", "1.5"] {
            assert!(!is_valid_quality(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_cookie_file_rules() {
        let dir = tempfile::TempDir::new().unwrap();
        let cookies = dir.path().join("cookies.txt");
        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();

        let config = ConfigBuilder::new()
            .lastfm_api_key("key")
            .cookie_file(&cookies)
            .build()
            .unwrap();
        assert_eq!(config.cookie_file, Some(cookies));

        let err = ConfigBuilder::new()
            .lastfm_api_key("key")
            .cookie_file(dir.path().join("missing.txt"))
            .build()
            .unwrap_err();
        assert_matches!(err, Error::ConfigurationError(ref msg) if msg.contains("missing.txt"));
    }

    #[test]
    fn test_read_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# credentials").unwrap();
        writeln!(file, "LAST_FM_KEY=from-file").unwrap();
        writeln!(file, "DOWNLOAD_DIR=\"My Music\"").unwrap();

        let vars = read_env_file(file.path()).unwrap();
        let config = ConfigBuilder::from_lookup(|key| vars.get(key).cloned())
            .build()
            .unwrap();

        assert_eq!(config.lastfm_api_key, "from-file");
        assert_eq!(config.download_dir, PathBuf::from("My Music"));
    }

    #[test]
    fn test_process_env_wins_over_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LAST_FM_KEY=file-key").unwrap();
        writeln!(file, "DOWNLOAD_DIR=file-dir").unwrap();
        writeln!(file, "YTDLP_PATH=file-ytdlp").unwrap();
        writeln!(file, "AUDIO_FORMAT=opus").unwrap();

        let process = lookup(&[(YTDLP_PATH, "/usr/local/bin/yt-dlp"), (AUDIO_FORMAT, " ")]);
        let config = ConfigBuilder::from_env_with(Some(file.path()), process)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.ytdlp_path, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(config.lastfm_api_key, "file-key");
        assert_eq!(config.download_dir, PathBuf::from("file-dir"));
        // Blank process values fall through to the file
        assert_eq!(config.audio_format, "opus");
    }

    #[test]
    fn test_from_env_reads_explicit_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ARTISTDL_LOG_FILE=/tmp/artistdl-from-file.log").unwrap();

        let builder = ConfigBuilder::from_env(Some(file.path())).unwrap();
        if std::env::var_os(LOG_FILE).is_none() {
            assert_eq!(builder.log_file_path(), PathBuf::from("/tmp/artistdl-from-file.log"));
        }
    }

    #[test]
    fn test_missing_explicit_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ConfigBuilder::from_env(Some(&dir.path().join("nope.env"))).unwrap_err();
        assert_matches!(err, Error::EnvFileError(_));
    }
}
