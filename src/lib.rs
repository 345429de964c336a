//! artistdl - Download an artist's most popular tracks
//!
//! Top tracks come from Last.fm, each one is matched to a YouTube Music song
//! and the audio is fetched with `yt-dlp`. Tracks are processed one after
//! another and a failing track never stops the run.

/// Client modules for the metadata, search and download services
pub mod clients;
/// Configuration from env files, the environment and CLI overrides
pub mod config;
/// Console and log file output
pub mod logging;
/// Sequential fetch, search and download pipeline
pub mod orchestrator;
