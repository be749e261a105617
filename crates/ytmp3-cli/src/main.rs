mod args;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Core logs stay quiet at the default level; progress is drawn by the CLI
    let filter = match cli.verbose {
        0 => "ytmp3=info,ytmp3_core=warn",
        1 => "ytmp3=debug,ytmp3_core=info",
        2 => "ytmp3=trace,ytmp3_core=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Convert {
            url,
            force,
            options,
        }) => commands::convert::run(&url, force, &options, config_path).await,
        Some(Commands::Batch {
            input,
            results,
            no_validate,
            options,
        }) => {
            commands::batch::run(&input, results.as_deref(), !no_validate, &options, config_path)
                .await
        }
        Some(Commands::Info { url, json }) => commands::info::run(&url, json, config_path).await,
        Some(Commands::Interactive { options }) => {
            commands::interactive::run(&options, config_path).await
        }
        Some(Commands::Doctor) => commands::doctor::run(config_path).await,
        Some(Commands::Setup) => commands::setup::run(config_path).await,
        Some(Commands::Config) => commands::config::run(config_path).await,
        None => {
            // If URL provided directly, treat as convert command
            if let Some(url) = cli.url {
                commands::convert::run(&url, cli.force, &cli.options, config_path).await
            } else {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
