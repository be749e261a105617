//! External tool discovery and the explicit yt-dlp installer bootstrap

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// What we learned about one external executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Found { path: PathBuf, version: String },
    /// Present but `--version` didn't run cleanly
    Broken { path: PathBuf, reason: String },
    Missing,
}

impl ToolStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, ToolStatus::Found { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainReport {
    pub yt_dlp: ToolStatus,
    pub ffmpeg: ToolStatus,
}

impl ToolchainReport {
    /// Conversions can start. yt-dlp reports a missing transcoder itself,
    /// per item, so only yt-dlp is required here.
    pub fn ready(&self) -> bool {
        self.yt_dlp.is_usable()
    }

    pub fn all_ok(&self) -> bool {
        self.yt_dlp.is_usable() && self.ffmpeg.is_usable()
    }
}

pub struct Toolchain;

impl Toolchain {
    /// Locate yt-dlp and ffmpeg and ask each for its version.
    pub async fn detect(config: &Config) -> ToolchainReport {
        let yt_dlp = match config.yt_dlp_path() {
            Ok(path) => probe(&path, "--version", parse_yt_dlp_version).await,
            Err(e) => {
                debug!("{}", e);
                ToolStatus::Missing
            }
        };

        let ffmpeg = match config.ffmpeg_path() {
            Ok(path) => probe(&ffmpeg_binary(&path), "-version", parse_ffmpeg_version).await,
            Err(e) => {
                debug!("{}", e);
                ToolStatus::Missing
            }
        };

        ToolchainReport { yt_dlp, ffmpeg }
    }
}

async fn probe(path: &Path, version_arg: &str, parse: fn(&str) -> String) -> ToolStatus {
    let Some(path) = resolve(path) else {
        return ToolStatus::Missing;
    };
    let path = path.as_path();

    match Command::new(path).arg(version_arg).output().await {
        Ok(out) if out.status.success() => ToolStatus::Found {
            path: path.to_path_buf(),
            version: parse(&String::from_utf8_lossy(&out.stdout)),
        },
        Ok(out) => ToolStatus::Broken {
            path: path.to_path_buf(),
            reason: format!("exit code {:?}", out.status.code()),
        },
        Err(e) => ToolStatus::Broken {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    }
}

/// A configured path may be a bare command name like `yt-dlp`; look those up
/// on PATH.
fn resolve(path: &Path) -> Option<PathBuf> {
    if path.exists() {
        Some(path.to_path_buf())
    } else {
        which::which(path).ok()
    }
}

/// `--ffmpeg-location` may name the bin directory rather than the binary.
pub fn ffmpeg_binary(location: &Path) -> PathBuf {
    if location.is_dir() {
        location.join(if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" })
    } else {
        location.to_path_buf()
    }
}

fn parse_yt_dlp_version(stdout: &str) -> String {
    stdout.trim().to_string()
}

/// `ffmpeg version 6.1.1 Copyright ...` -> `6.1.1`
fn parse_ffmpeg_version(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(2))
        .unwrap_or("unknown")
        .to_string()
}

/// Result of [`install_yt_dlp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    Failed { code: Option<i32> },
}

/// `python -m pip install --user --upgrade yt-dlp`, output passed through.
pub async fn install_yt_dlp(python: &Path) -> std::io::Result<InstallOutcome> {
    info!("Installing yt-dlp with {}", python.display());

    let status = Command::new(python)
        .args(["-m", "pip", "install", "--user", "--upgrade", "yt-dlp"])
        .stdin(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(InstallOutcome::Installed)
    } else {
        warn!("pip exited with {:?}", status.code());
        Ok(InstallOutcome::Failed {
            code: status.code(),
        })
    }
}
