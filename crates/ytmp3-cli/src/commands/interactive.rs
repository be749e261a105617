//! Line-driven session with a single-download path and a batch list.
//!
//! Conversions run on the core [`Worker`]; this loop only reads commands and
//! renders the worker's events as they arrive.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::args::ConvertArgs;
use crate::output;
use ytmp3_core::{
    batch::{self, BatchEvent},
    error::WorkerError,
    toolchain::{ToolStatus, Toolchain},
    validate,
    worker::{Job, Worker, WorkerEvent},
    Bitrate, Config, Convert, ConvertOptions, YtDlp,
};

const HELP: &str = "\
Commands:
  <url>            download one URL
  get <url>        download one URL even if it doesn't look like a video link
  add <url>        append a URL to the batch list
  load <file>      replace the batch list with the URLs in a file
  list             show the batch list
  clear            empty the batch list
  run              download everything in the batch list
  quality <kbps>   128, 192 or 320
  output <dir>     change the download folder
  status           show current settings
  help             this text
  quit             leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Single { url: String, force: bool },
    Add(String),
    Load(PathBuf),
    List,
    Clear,
    Run,
    Quality(Bitrate),
    Output(PathBuf),
    Status,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "get" | "download" if !rest.is_empty() => Command::Single {
            url: rest.to_string(),
            force: true,
        },
        "add" if !rest.is_empty() => Command::Add(rest.to_string()),
        "load" if !rest.is_empty() => Command::Load(PathBuf::from(rest)),
        "output" | "out" if !rest.is_empty() => Command::Output(PathBuf::from(rest)),
        "quality" => match rest.parse() {
            Ok(bitrate) => Command::Quality(bitrate),
            Err(e) => Command::Invalid(e),
        },
        "get" | "download" | "add" | "load" | "output" | "out" => {
            Command::Invalid(format!("usage: {word} <argument>"))
        }
        "list" | "ls" => Command::List,
        "clear" => Command::Clear,
        "run" => Command::Run,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ if rest.is_empty() && (line.contains("://") || validate::looks_like_video_url(line)) => {
            Command::Single {
                url: line.to_string(),
                force: false,
            }
        }
        _ => Command::Invalid(format!("unknown command: {word} (try `help`)")),
    }
}

/// Interface state owned by the UI loop; the worker never touches it.
struct Session {
    options: ConvertOptions,
    results_file: PathBuf,
    validate: bool,
    pending: Vec<String>,
}

enum Flow {
    Continue,
    Quit,
}

pub async fn run(options: &ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    let report = Toolchain::detect(&config).await;
    match &report.yt_dlp {
        ToolStatus::Found { version, .. } => log(format!("yt-dlp {version} found")),
        _ => log("yt-dlp not found. Run `ytmp3 setup` first."),
    }
    match &report.ffmpeg {
        ToolStatus::Found { path, .. } => log(format!("FFmpeg found: {}", path.display())),
        _ => log("FFmpeg not found; conversions will fail until it is installed"),
    }

    let converter = YtDlp::from_config(&config).context("Cannot start without yt-dlp")?;
    let (tx, mut events) = mpsc::channel(64);
    let worker = Worker::new(converter, tx);

    let mut session = Session {
        options: options.resolve(&config),
        results_file: config.batch.results_file.clone(),
        validate: config.batch.validate,
        pending: Vec::new(),
    };

    println!("{HELP}\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Piped input: let the last submitted job finish.
                    if worker.is_busy() {
                        wait_for_job(&mut events).await;
                    }
                    break;
                };
                if let Flow::Quit = session.handle(parse_command(&line), &worker).await {
                    break;
                }
            }
            Some(event) = events.recv() => render(event),
        }
    }

    if worker.is_busy() {
        log("A download was still running and has been abandoned");
    }
    Ok(())
}

impl Session {
    async fn handle<C: Convert + 'static>(&mut self, command: Command, worker: &Worker<C>) -> Flow {
        match command {
            Command::Single { url, force } => {
                if !force && !validate::looks_like_video_url(&url) {
                    log("This doesn't look like a video URL. Use `get <url>` to try anyway.");
                } else {
                    self.submit(
                        worker,
                        Job::Single {
                            url,
                            options: self.options.clone(),
                        },
                    );
                }
            }
            Command::Add(url) => {
                self.pending.push(url);
                log(format!("{} URLs in the batch list", self.pending.len()));
            }
            Command::Load(path) => {
                self.pending = batch::read_urls(&path).await;
                log(format!("Loaded {} URLs from file", self.pending.len()));
            }
            Command::List => {
                if self.pending.is_empty() {
                    log("The batch list is empty");
                }
                for (i, url) in self.pending.iter().enumerate() {
                    println!("  {:>3}. {}", i + 1, url);
                }
            }
            Command::Clear => {
                self.pending.clear();
                log("URL list cleared");
            }
            Command::Run => self.run_batch(worker),
            Command::Quality(bitrate) => {
                self.options.bitrate = bitrate;
                log(format!("Quality set to {bitrate}"));
            }
            Command::Output(dir) => {
                log(format!("Saving to {}", dir.display()));
                self.options.output_dir = dir;
            }
            Command::Status => {
                let state = if worker.is_busy() { "downloading" } else { "idle" };
                log(format!(
                    "{state}; {} URLs queued; {} into {}",
                    self.pending.len(),
                    self.options.bitrate,
                    self.options.output_dir.display()
                ));
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
            Command::Empty => {}
            Command::Invalid(msg) => log(msg),
        }
        Flow::Continue
    }

    fn run_batch<C: Convert + 'static>(&self, worker: &Worker<C>) {
        if self.pending.is_empty() {
            log("Please enter some URLs first (add <url> or load <file>)");
            return;
        }

        let urls = if self.validate {
            let (accepted, rejected) = validate::partition_urls(self.pending.iter().cloned());
            if !rejected.is_empty() {
                for line in output::rejected_lines(&rejected) {
                    log(line);
                }
                log("Continuing with valid URLs only");
            }
            accepted
        } else {
            self.pending.clone()
        };

        if urls.is_empty() {
            log("No valid URLs to download");
            return;
        }

        self.submit(
            worker,
            Job::Batch {
                urls,
                options: self.options.clone(),
                results_file: self.results_file.clone(),
            },
        );
    }

    fn submit<C: Convert + 'static>(&self, worker: &Worker<C>, job: Job) {
        match worker.submit(job) {
            Ok(_) => {}
            Err(WorkerError::Busy) => log("A download is already in progress"),
            Err(e) => log(e.to_string()),
        }
    }
}

fn render(event: WorkerEvent) {
    match event {
        WorkerEvent::Started { description, .. } => log(description),
        WorkerEvent::Info { info, .. } => log(format!("Title: {}", info.title)),
        WorkerEvent::Progress { event, .. } => match event {
            BatchEvent::ItemStarted {
                index,
                total,
                preview,
            } => log(format!("[{index}/{total}] Processing: {preview}")),
            BatchEvent::ItemFinished { result, .. } => log(output::item_line(&result)),
        },
        WorkerEvent::SingleFinished { result, .. } => {
            if result.success {
                log(format!(
                    "Download complete: {}",
                    result.filename.as_deref().unwrap_or("Unknown")
                ));
            } else {
                log(format!(
                    "Download failed: {}",
                    result.error.as_deref().unwrap_or("Unknown error")
                ));
            }
        }
        WorkerEvent::BatchFinished {
            summary, saved_to, ..
        } => {
            log(format!(
                "Batch complete: {} of {} succeeded, {} failed",
                summary.succeeded,
                summary.total(),
                summary.failed
            ));
            match saved_to {
                Some(path) => log(format!("Results saved to {}", path.display())),
                None => log("Could not save the results file"),
            }
        }
    }
}

/// Render events until the running job reports that it finished.
async fn wait_for_job(events: &mut mpsc::Receiver<WorkerEvent>) {
    while let Some(event) = events.recv().await {
        let finished = matches!(
            event,
            WorkerEvent::SingleFinished { .. } | WorkerEvent::BatchFinished { .. }
        );
        render(event);
        if finished {
            break;
        }
    }
}

fn log(message: impl AsRef<str>) {
    let timestamp = chrono::Local::now().format("%H:%M:%S");
    println!("[{}] {}", timestamp, message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urls() {
        assert_eq!(
            parse_command("  https://youtu.be/abc  "),
            Command::Single {
                url: "https://youtu.be/abc".to_string(),
                force: false
            }
        );
        assert_eq!(
            parse_command("https://vimeo.com/1"),
            Command::Single {
                url: "https://vimeo.com/1".to_string(),
                force: false
            }
        );
        assert_eq!(
            parse_command("get https://vimeo.com/1"),
            Command::Single {
                url: "https://vimeo.com/1".to_string(),
                force: true
            }
        );
    }

    #[test]
    fn test_parse_batch_commands() {
        assert_eq!(
            parse_command("add https://youtu.be/x"),
            Command::Add("https://youtu.be/x".to_string())
        );
        assert_eq!(
            parse_command("LOAD my urls.txt"),
            Command::Load(PathBuf::from("my urls.txt"))
        );
        assert_eq!(parse_command("ls"), Command::List);
        assert_eq!(parse_command("clear"), Command::Clear);
        assert_eq!(parse_command("run"), Command::Run);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("exit"), Command::Quit);
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(parse_command("quality 320"), Command::Quality(Bitrate::Kbps320));
        assert!(matches!(parse_command("quality 999"), Command::Invalid(_)));
        assert_eq!(
            parse_command("output ~/Music"),
            Command::Output(PathBuf::from("~/Music"))
        );
    }

    #[test]
    fn test_parse_missing_argument_and_unknown() {
        assert!(matches!(parse_command("add"), Command::Invalid(msg) if msg.contains("usage")));
        assert!(matches!(parse_command("dance"), Command::Invalid(msg) if msg.contains("unknown")));
    }

    #[tokio::test]
    async fn test_wait_for_job_stops_at_finish() {
        use ytmp3_core::{batch::ConversionResult, worker::JobId};

        let job = JobId::nil();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(WorkerEvent::Started {
            job,
            description: "Starting download".to_string(),
        })
        .await
        .unwrap();
        tx.send(WorkerEvent::SingleFinished {
            job,
            result: ConversionResult::failed("https://youtu.be/abc", "gone"),
        })
        .await
        .unwrap();
        tx.send(WorkerEvent::Started {
            job,
            description: "next".to_string(),
        })
        .await
        .unwrap();

        wait_for_job(&mut rx).await;
        assert!(matches!(rx.try_recv(), Ok(WorkerEvent::Started { .. })));
    }
}
