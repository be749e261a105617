use anyhow::Result;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

use crate::args::ConvertArgs;
use crate::output;
use ytmp3_core::{
    batch::{self, BatchEvent, BatchSummary},
    validate, Config, YtDlp,
};

pub async fn run(
    input: &Path,
    results_file: Option<&Path>,
    filter_invalid: bool,
    options: &ConvertArgs,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;

    let urls = batch::read_urls(input).await;
    if urls.is_empty() {
        println!("No URLs found in {}", input.display());
        return Ok(());
    }
    println!("Loaded {} URLs from {}", urls.len(), input.display());

    let urls = if filter_invalid && config.batch.validate {
        let (accepted, rejected) = validate::partition_urls(urls);
        if !rejected.is_empty() {
            for line in output::rejected_lines(&rejected) {
                println!("{line}");
            }
            println!("Continuing with valid URLs only.");
        }
        accepted
    } else {
        urls
    };

    if urls.is_empty() {
        println!("No valid URLs to download");
        return Ok(());
    }

    let convert_options = options.resolve(&config);
    let converter = YtDlp::from_config(&config)?;
    debug!("Using {} with {:?}", converter.path().display(), convert_options);

    println!(
        "Converting {} URLs at {} into {}\n",
        urls.len(),
        convert_options.bitrate,
        convert_options.output_dir.display()
    );

    let bar = output::batch_bar(urls.len() as u64);
    let (tx, mut rx) = mpsc::channel(32);

    let pb = bar.clone();
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::ItemStarted { preview, .. } => pb.set_message(preview),
                BatchEvent::ItemFinished { result, .. } => {
                    pb.println(output::item_line(&result));
                    pb.inc(1);
                }
            }
        }
    });

    let results = batch::run_batch(&converter, &urls, &convert_options, &tx).await;
    drop(tx);
    progress_handle.await?;
    bar.finish_and_clear();

    let summary = BatchSummary::of(&results);
    println!("\n=== Batch Complete ===");
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed: {}", summary.failed);

    if summary.failed > 0 {
        println!("\nFailed URLs:");
        for result in results.iter().filter(|r| !r.success) {
            println!(
                "  {} - {}",
                result.url,
                result.error.as_deref().unwrap_or("Unknown error")
            );
        }
    }

    let results_path = results_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.batch.results_file.clone());
    if batch::save_results(&results, &results_path).await {
        println!("\nResults saved to {}", results_path.display());
    } else {
        println!("\nCould not save results to {}", results_path.display());
    }

    Ok(())
}
