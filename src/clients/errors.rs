use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to load env file: {0}")]
    EnvFileError(#[from] dotenvy::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("LastFM API error {code}: {message}")]
    LastFMApiError { code: i64, message: String },

    #[error("LastFM API unexpected response: {0}")]
    LastFMUnexpectedResponse(String),

    #[error("No tracks found for artist: {0}")]
    NoTracksFound(String),

    #[error("YouTube Music unexpected response: {0}")]
    YtMusicUnexpectedResponse(String),

    #[error("No search match for: {0}")]
    NoSearchMatch(String),

    #[error("yt-dlp not found: {0}")]
    YtDlpNotFound(String),

    #[error("Music download failed: {0}")]
    DownloadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    PromptError(#[from] dialoguer::Error),

    #[error("Logging error: {0}")]
    LoggingError(#[from] log::SetLoggerError),
}

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;
