use anyhow::{Context, Result};
use std::path::Path;

use ytmp3_core::{Config, Convert, YtDlp};

pub async fn run(url: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let converter = YtDlp::from_config(&config)?;

    let info = converter
        .probe(url.trim())
        .await
        .context("Failed to fetch video info")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let total = info.duration.max(0.0).round() as u64;
    let (minutes, seconds) = (total / 60, total % 60);

    println!("Title:     {}", info.title);
    println!("Uploader:  {}", info.uploader);
    println!("Duration:  {}:{:02}", minutes, seconds);
    println!("Views:     {}", info.view_count);
    if !info.thumbnail.is_empty() {
        println!("Thumbnail: {}", info.thumbnail);
    }

    Ok(())
}
