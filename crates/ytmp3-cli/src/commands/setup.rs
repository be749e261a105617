use anyhow::{bail, Context, Result};
use std::path::Path;
use ytmp3_core::{
    toolchain::{self, InstallOutcome, ToolStatus, Toolchain},
    Config,
};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    let report = Toolchain::detect(&config).await;
    if let ToolStatus::Found { ref version, .. } = report.yt_dlp {
        println!("yt-dlp {version} is installed; checking for upgrades...\n");
    } else {
        println!("Installing yt-dlp...\n");
    }

    let python = config
        .python_path()
        .context("Python 3 not found. Install it, or set paths.python in the config")?;

    match toolchain::install_yt_dlp(&python)
        .await
        .context("Failed to run pip")?
    {
        InstallOutcome::Installed => println!("\nyt-dlp installed successfully"),
        InstallOutcome::Failed { code } => {
            bail!("pip failed with exit code {code:?}. Install manually with: pip install yt-dlp")
        }
    }

    let report = Toolchain::detect(&config).await;
    if !report.yt_dlp.is_usable() {
        println!("yt-dlp is installed but not on PATH.");
        println!("Add pip's user script directory to PATH, or set paths.yt_dlp in the config.");
    }
    if !report.ffmpeg.is_usable() {
        println!("\nFFmpeg is required for audio conversion and was not found.");
        println!("Download from: https://ffmpeg.org/download.html");
    }

    println!("\n=== Setup Complete ===");
    println!("Run 'ytmp3 doctor' to verify installation.");

    Ok(())
}
