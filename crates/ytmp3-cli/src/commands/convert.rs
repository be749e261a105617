use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::debug;

use crate::args::ConvertArgs;
use crate::output;
use ytmp3_core::{
    batch::{self, preview},
    validate, Config, Convert, YtDlp,
};

pub async fn run(
    url: &str,
    force: bool,
    options: &ConvertArgs,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let url = url.trim();

    if !force && !validate::looks_like_video_url(url) {
        bail!("{url} doesn't look like a video link. Pass --force to try anyway.");
    }

    let convert_options = options.resolve(&config);
    let converter = YtDlp::from_config(&config)?;
    debug!("Using {} with {:?}", converter.path().display(), convert_options);

    let pb = output::spinner();
    pb.set_message(format!("Fetching info: {}", preview(url, batch::PREVIEW_LEN)));

    let info = match converter.probe(url).await {
        Ok(info) => info,
        Err(e) => {
            pb.abandon_with_message("Could not fetch video info");
            return Err(e).context("yt-dlp could not read the video");
        }
    };

    pb.set_message(format!(
        "Converting at {}: {}",
        convert_options.bitrate,
        preview(&info.title, 40)
    ));

    let result = batch::convert_one(&converter, url, &convert_options).await;

    if result.success {
        pb.finish_with_message(format!(
            "Done: {}",
            result.title.as_deref().unwrap_or(&info.title)
        ));
        if let Some(ref filename) = result.filename {
            println!("\nSaved to: {filename}");
        }
        Ok(())
    } else {
        let error = result.error.unwrap_or_else(|| "Unknown error".to_string());
        pb.abandon_with_message(format!("Failed: {error}"));
        bail!("Download failed: {error}")
    }
}
