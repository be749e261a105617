//! Background worker for interactive front-ends
//!
//! The front-end submits a [`Job`] and listens for [`WorkerEvent`]s on a
//! channel. At most one job runs at a time; a second submission while busy is
//! rejected rather than queued. There is no cancellation.

use crate::batch::{self, BatchEvent, BatchSummary, ConversionResult};
use crate::converter::{Convert, ConvertOptions, VideoInfo};
use crate::error::WorkerError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone)]
pub enum Job {
    Single {
        url: String,
        options: ConvertOptions,
    },
    Batch {
        urls: Vec<String>,
        options: ConvertOptions,
        results_file: PathBuf,
    },
}

impl Job {
    fn describe(&self) -> String {
        match self {
            Job::Single { url, .. } => {
                format!("Starting download: {}", batch::preview(url, batch::PREVIEW_LEN))
            }
            Job::Batch { urls, .. } => format!("Starting batch download of {} URLs", urls.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Started {
        job: JobId,
        description: String,
    },
    /// Video info looked up before a single download
    Info {
        job: JobId,
        info: VideoInfo,
    },
    Progress {
        job: JobId,
        event: BatchEvent,
    },
    SingleFinished {
        job: JobId,
        result: ConversionResult,
    },
    BatchFinished {
        job: JobId,
        results: Vec<ConversionResult>,
        summary: BatchSummary,
        /// `None` when the results file couldn't be written
        saved_to: Option<PathBuf>,
    },
}

pub struct Worker<C> {
    converter: Arc<C>,
    busy: Arc<AtomicBool>,
    events: mpsc::Sender<WorkerEvent>,
}

/// Clears the busy flag when the job task ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: Convert + 'static> Worker<C> {
    pub fn new(converter: C, events: mpsc::Sender<WorkerEvent>) -> Self {
        Self {
            converter: Arc::new(converter),
            busy: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `job` on a background task. Must be called inside a tokio runtime.
    pub fn submit(&self, job: Job) -> Result<JobId, WorkerError> {
        let empty = match &job {
            Job::Single { url, .. } => url.trim().is_empty(),
            Job::Batch { urls, .. } => urls.is_empty(),
        };
        if empty {
            return Err(WorkerError::EmptyJob);
        }

        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkerError::Busy)?;
        let guard = BusyGuard(self.busy.clone());

        let id = Uuid::new_v4();
        let converter = self.converter.clone();
        let events = self.events.clone();
        debug!("Submitting job {}", id);

        tokio::spawn(async move {
            let finished = run_job(id, job, converter.as_ref(), &events).await;
            // Free the slot before announcing completion so the listener can
            // submit again straight away.
            drop(guard);
            let _ = events.send(finished).await;
        });

        Ok(id)
    }
}

async fn run_job<C: Convert>(
    id: JobId,
    job: Job,
    converter: &C,
    events: &mpsc::Sender<WorkerEvent>,
) -> WorkerEvent {
    let _ = events
        .send(WorkerEvent::Started {
            job: id,
            description: job.describe(),
        })
        .await;

    match job {
        Job::Single { url, options } => {
            let result = match batch::probe_one(converter, &url).await {
                Ok(info) => {
                    info!("Title: {}", info.title);
                    let _ = events.send(WorkerEvent::Info { job: id, info }).await;
                    batch::convert_one(converter, &url, &options).await
                }
                Err(e) => ConversionResult::failed(url, e),
            };
            WorkerEvent::SingleFinished { job: id, result }
        }
        Job::Batch {
            urls,
            options,
            results_file,
        } => {
            let (tx, mut rx) = mpsc::channel(32);
            let forward_to = events.clone();
            let forward = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = forward_to.send(WorkerEvent::Progress { job: id, event }).await;
                }
            });

            let results = batch::run_batch(converter, &urls, &options, &tx).await;
            drop(tx);
            let _ = forward.await;

            let summary = BatchSummary::of(&results);
            info!(
                "Batch complete: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );

            let saved_to = if batch::save_results(&results, &results_file).await {
                Some(results_file)
            } else {
                None
            };

            WorkerEvent::BatchFinished {
                job: id,
                results,
                summary,
                saved_to,
            }
        }
    }
}
