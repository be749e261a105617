use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use ytmp3_core::{Bitrate, Config, ConvertOptions};

#[derive(Parser)]
#[command(name = "ytmp3")]
#[command(author, version, about = "Convert video links to MP3 with yt-dlp")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video URL to convert (shorthand for `convert <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Convert even if the URL doesn't look like a video link
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub options: ConvertArgs,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single URL to MP3
    Convert {
        /// Video URL
        url: String,

        /// Convert even if the URL doesn't look like a video link
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Convert every URL listed in a file, one after another
    Batch {
        /// File containing URLs (one per line, `#` comments allowed)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the JSON results
        #[arg(long)]
        results: Option<PathBuf>,

        /// Submit every entry, even ones that don't look like video links
        #[arg(long)]
        no_validate: bool,

        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Show video information without downloading
    Info {
        /// Video URL
        url: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session with single and batch downloads
    Interactive {
        #[command(flatten)]
        options: ConvertArgs,
    },

    /// Check for yt-dlp and FFmpeg
    Doctor,

    /// Install or upgrade yt-dlp with pip
    Setup,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConvertArgs {
    /// Audio quality in kbps
    #[arg(short, long, value_enum)]
    pub quality: Option<Quality>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't tag the MP3 with title/artist metadata
    #[arg(long)]
    pub no_metadata: bool,

    /// Embed the video thumbnail as cover art
    #[arg(long)]
    pub embed_thumbnail: bool,

    /// FFmpeg binary or directory to hand to yt-dlp
    #[arg(long, value_name = "PATH")]
    pub ffmpeg_location: Option<PathBuf>,
}

impl ConvertArgs {
    /// Command-line flags layered over the configured defaults
    pub fn resolve(&self, config: &Config) -> ConvertOptions {
        let mut options = config.convert_options();
        if let Some(quality) = self.quality {
            options.bitrate = quality.into();
        }
        if let Some(ref dir) = self.output {
            options.output_dir = dir.clone();
        }
        if self.no_metadata {
            options.add_metadata = false;
        }
        if self.embed_thumbnail {
            options.embed_thumbnail = true;
        }
        if let Some(ref ffmpeg) = self.ffmpeg_location {
            options.ffmpeg_location = Some(ffmpeg.clone());
        }
        options
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    /// 128 kbps - small files
    #[value(name = "128")]
    Low,
    /// 192 kbps - recommended
    #[value(name = "192")]
    Standard,
    /// 320 kbps - highest
    #[value(name = "320")]
    High,
}

impl From<Quality> for Bitrate {
    fn from(q: Quality) -> Self {
        match q {
            Quality::Low => Bitrate::Kbps128,
            Quality::Standard => Bitrate::Kbps192,
            Quality::High => Bitrate::Kbps320,
        }
    }
}
