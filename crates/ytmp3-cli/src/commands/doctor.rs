use anyhow::Result;
use std::path::Path;
use ytmp3_core::{
    toolchain::{ToolStatus, Toolchain},
    Config,
};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 dependency check\n");

    let report = Toolchain::detect(&config).await;

    print_status("yt-dlp", &report.yt_dlp);
    if !report.yt_dlp.is_usable() {
        println!("           Install with: ytmp3 setup   (or: pip install yt-dlp)");
    }

    print_status("ffmpeg", &report.ffmpeg);
    if !report.ffmpeg.is_usable() {
        println!("           Download from: https://ffmpeg.org/download.html");
        println!("           Then add it to PATH or set paths.ffmpeg in the config");
    }

    println!();
    if report.all_ok() {
        println!("All dependencies OK!");
    } else if report.ready() {
        println!("yt-dlp is ready, but MP3 conversion needs FFmpeg.");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

fn print_status(name: &str, status: &ToolStatus) {
    let label = format!("{name}:");
    match status {
        ToolStatus::Found { path, version } => {
            println!("{label:<10} OK ({version}) {}", path.display())
        }
        ToolStatus::Broken { path, reason } => {
            println!("{label:<10} FOUND at {} but failed to run: {reason}", path.display())
        }
        ToolStatus::Missing => println!("{label:<10} NOT FOUND"),
    }
}
