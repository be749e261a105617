//! ytmp3-core: URL-to-MP3 conversion on top of yt-dlp, single or in batches

pub mod batch;
pub mod config;
pub mod converter;
pub mod error;
pub mod sanitize;
pub mod toolchain;
pub mod validate;
pub mod worker;

pub use config::Config;
pub use converter::{Bitrate, Convert, ConvertOptions, YtDlp};
pub use error::{BatchError, ConfigError, ConvertError, WorkerError};
