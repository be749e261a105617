//! Single-item conversion: hand a URL to yt-dlp and get an MP3 back

use crate::config::Config;
use crate::error::ConvertError;
use crate::sanitize::clean_filename;
use serde::{Deserialize, Deserializer, Serialize};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// MP3 bitrate tier passed to the transcoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitrate {
    Kbps128,
    #[default]
    Kbps192,
    Kbps320,
}

impl Bitrate {
    pub fn kbps(&self) -> u32 {
        match self {
            Bitrate::Kbps128 => 128,
            Bitrate::Kbps192 => 192,
            Bitrate::Kbps320 => 320,
        }
    }

    /// Value for yt-dlp's `--audio-quality`
    pub fn as_audio_quality(&self) -> String {
        format!("{}K", self.kbps())
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            128 => Ok(Bitrate::Kbps128),
            192 => Ok(Bitrate::Kbps192),
            320 => Ok(Bitrate::Kbps320),
            other => Err(format!("unsupported bitrate {other} (expected 128, 192 or 320)")),
        }
    }
}

impl From<Bitrate> for u32 {
    fn from(b: Bitrate) -> u32 {
        b.kbps()
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['k', 'K']);
        let value: u32 = trimmed
            .parse()
            .map_err(|_| format!("not a bitrate: {s}"))?;
        Bitrate::try_from(value)
    }
}

impl std::fmt::Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kbps", self.kbps())
    }
}

/// Options shared by every item of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub output_dir: PathBuf,
    pub bitrate: Bitrate,
    pub add_metadata: bool,
    pub embed_thumbnail: bool,
    /// Handed to yt-dlp as `--ffmpeg-location`; yt-dlp searches PATH otherwise.
    pub ffmpeg_location: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            bitrate: Bitrate::default(),
            add_metadata: true,
            embed_thumbnail: false,
            ffmpeg_location: None,
        }
    }
}

/// What yt-dlp reports about a video before downloading it.
///
/// yt-dlp writes `null` for fields an extractor can't fill (live streams,
/// premieres), so null and missing are treated alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default = "unknown", deserialize_with = "null_as_unknown")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default = "unknown", deserialize_with = "null_as_unknown")]
    pub uploader: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: u64,
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown))
}

/// A finished conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub title: String,
    pub filename: PathBuf,
    pub size: Option<u64>,
}

/// The single-item operation the batch runner and worker are built on.
pub trait Convert: Send + Sync {
    /// Look up video info without downloading.
    fn probe(&self, url: &str) -> impl Future<Output = Result<VideoInfo, ConvertError>> + Send;

    /// Download `url` and transcode it to MP3 under `options.output_dir`.
    fn convert(
        &self,
        url: &str,
        options: &ConvertOptions,
    ) -> impl Future<Output = Result<Converted, ConvertError>> + Send;
}

/// [`Convert`] backed by the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    yt_dlp_path: PathBuf,
}

impl YtDlp {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self { yt_dlp_path }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConvertError> {
        config
            .yt_dlp_path()
            .map(Self::new)
            .map_err(|_| ConvertError::YtDlpNotFound)
    }

    pub fn path(&self) -> &Path {
        &self.yt_dlp_path
    }
}

impl Convert for YtDlp {
    async fn probe(&self, url: &str) -> Result<VideoInfo, ConvertError> {
        debug!("Probing: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist"])
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(ConvertError::YtDlpFailed {
                code: output.status.code(),
                message: error_message(&stderr),
            });
        }

        parse_video_info(&output.stdout)
    }

    async fn convert(&self, url: &str, options: &ConvertOptions) -> Result<Converted, ConvertError> {
        tokio::fs::create_dir_all(&options.output_dir).await?;

        let info = self.probe(url).await?;
        let stem = clean_filename(&info.title);
        info!("Converting \"{}\" at {}", info.title, options.bitrate);

        let template = options
            .output_dir
            .join(format!("{}.%(ext)s", escape_template(&stem)));
        let args = build_download_args(url, &template, options);
        debug!("yt-dlp args: {:?}", args);

        let output = Command::new(&self.yt_dlp_path).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(ConvertError::YtDlpFailed {
                code: output.status.code(),
                message: error_message(&stderr),
            });
        }

        let filename = locate_output(&options.output_dir, &stem).await?;
        let size = tokio::fs::metadata(&filename).await.ok().map(|m| m.len());
        info!("Saved: {}", filename.display());

        Ok(Converted {
            title: info.title,
            filename,
            size,
        })
    }
}

/// The fixed-shape yt-dlp invocation for one download.
pub fn build_download_args(url: &str, template: &Path, options: &ConvertOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--format",
        "bestaudio/best",
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--audio-quality",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(options.bitrate.as_audio_quality().into());

    if options.add_metadata {
        args.push("--embed-metadata".into());
    }
    if options.embed_thumbnail {
        args.push("--embed-thumbnail".into());
    }
    if let Some(ref ffmpeg) = options.ffmpeg_location {
        args.push("--ffmpeg-location".into());
        args.push(ffmpeg.clone().into_os_string());
    }

    for flag in ["--no-playlist", "--no-progress", "--quiet", "--no-warnings"] {
        args.push(flag.into());
    }

    args.push("--output".into());
    args.push(template.as_os_str().to_owned());
    args.push("--".into());
    args.push(url.into());
    args
}

/// Parse the first JSON document yt-dlp printed.
pub fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, ConvertError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ConvertError::InfoParse("yt-dlp printed nothing".to_string()))?;

    serde_json::from_str(line).map_err(|e| ConvertError::InfoParse(e.to_string()))
}

/// `%` starts a yt-dlp template field, so literal ones are doubled.
fn escape_template(stem: &str) -> String {
    stem.replace('%', "%%")
}

/// Last `ERROR:` line from yt-dlp, or the last line of stderr.
fn error_message(stderr: &str) -> String {
    let from_marker = regex::Regex::new(r"(?m)^ERROR:\s*(.+?)\s*$").ok().and_then(|re| {
        re.captures_iter(stderr)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    });

    from_marker.unwrap_or_else(|| {
        stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("yt-dlp produced no output")
            .to_string()
    })
}

async fn locate_output(dir: &Path, stem: &str) -> Result<PathBuf, ConvertError> {
    let exact = dir.join(format!("{stem}.mp3"));
    if tokio::fs::metadata(&exact).await.is_ok() {
        return Ok(exact);
    }

    warn!("{} missing, scanning {}", exact.display(), dir.display());
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(stem) && name.ends_with(".mp3") {
            return Ok(entry.path());
        }
    }

    Err(ConvertError::OutputMissing)
}
