use anyhow::Result;
use std::path::Path;
use ytmp3_core::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 configuration\n");
    print!("{}", toml::to_string_pretty(&config)?);

    if config.paths.yt_dlp.is_none() {
        println!("\n# paths.yt_dlp unset: auto-detected from PATH");
    }
    if config.paths.ffmpeg.is_none() {
        println!("# paths.ffmpeg unset: yt-dlp searches PATH");
    }

    println!("\nConfig sources (later entries override earlier ones):");
    if let Some(default) = Config::default_path() {
        println!("  1. {}", default.display());
    }
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables (YTMP3_<SECTION>__<KEY>)");

    Ok(())
}
