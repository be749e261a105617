//! Error types for ytmp3-core

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while turning one URL into an MP3.
///
/// Batch records flatten all of these into a single error message.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("yt-dlp not found. Run `ytmp3 setup` or install it with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code {code:?}: {message}")]
    YtDlpFailed { code: Option<i32>, message: String },

    #[error("Failed to parse video info: {0}")]
    InfoParse(String),

    #[error("MP3 file not found after conversion")]
    OutputMissing,

    #[error("Conversion panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read URL list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write results to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed results file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkerError {
    #[error("A download is already in progress")]
    Busy,

    #[error("Nothing to download")]
    EmptyJob,
}
