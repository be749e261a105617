//! Configuration management for ytmp3

use crate::converter::{Bitrate, ConvertOptions};
use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary or its directory, handed to yt-dlp as-is
    pub ffmpeg: Option<PathBuf>,
    /// Python used by `ytmp3 setup` (auto-detected if not set)
    pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where converted files go
    pub directory: PathBuf,
    /// MP3 bitrate in kbps: 128, 192 or 320
    pub quality: Bitrate,
    /// Tag the MP3 with title/artist metadata
    pub add_metadata: bool,
    /// Embed the video thumbnail as cover art
    pub embed_thumbnail: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// File the batch results are written to
    pub results_file: PathBuf,
    /// Drop URLs that don't look like watch/short links before running
    pub validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            output: OutputConfig {
                directory: PathBuf::from("downloads"),
                quality: Bitrate::default(),
                add_metadata: true,
                embed_thumbnail: false,
            },
            batch: BatchConfig {
                results_file: PathBuf::from(crate::batch::DEFAULT_RESULTS_FILE),
                validate: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = Self::default_path() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // YTMP3_OUTPUT__QUALITY=320, YTMP3_PATHS__FFMPEG=...
        figment = figment.merge(Env::prefixed("YTMP3_").split("__"));

        figment.extract().map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// `<config dir>/ytmp3/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytmp3/config.toml"))
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Get Python path for the installer bootstrap
    pub fn python_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.python {
            return Ok(path.clone());
        }

        which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|_| ConfigError::InvalidValue("python3 not found in PATH".to_string()))
    }

    /// Per-item conversion options derived from the `[output]` section
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            output_dir: self.output.directory.clone(),
            bitrate: self.output.quality,
            add_metadata: self.output.add_metadata,
            embed_thumbnail: self.output.embed_thumbnail,
            ffmpeg_location: self.paths.ffmpeg.clone(),
        }
    }
}
