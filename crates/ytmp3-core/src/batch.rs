//! Batch helpers: URL lists in, ordered result records out

use crate::converter::{Convert, ConvertOptions, Converted, VideoInfo};
use crate::error::{BatchError, ConvertError};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Results file name used when the caller doesn't pick one.
pub const DEFAULT_RESULTS_FILE: &str = "batch_results.json";

/// URL previews in progress events are cut to this many characters.
pub const PREVIEW_LEN: usize = 50;

/// Outcome of one URL. `success` and `error` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub url: String,
}

impl ConversionResult {
    pub fn succeeded(url: impl Into<String>, converted: Converted) -> Self {
        Self {
            success: true,
            title: Some(converted.title),
            filename: Some(converted.filename.display().to_string()),
            size: converted.size,
            error: None,
            url: url.into(),
        }
    }

    pub fn failed(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            success: false,
            title: None,
            filename: None,
            size: None,
            error: Some(error.to_string()),
            url: url.into(),
        }
    }

    pub fn from_outcome(url: impl Into<String>, outcome: Result<Converted, ConvertError>) -> Self {
        match outcome {
            Ok(converted) => Self::succeeded(url, converted),
            Err(e) => Self::failed(url, e),
        }
    }
}

/// Progress side channel of [`run_batch`]. Indices are 1-based.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    ItemStarted {
        index: usize,
        total: usize,
        preview: String,
    },
    ItemFinished {
        index: usize,
        total: usize,
        result: ConversionResult,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(results: &[ConversionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Keep entries that are neither blank nor `#` comments, trimmed, in order.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Read a newline-delimited URL list.
pub async fn try_read_urls(path: &Path) -> Result<Vec<String>, BatchError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_url_list(&content))
}

/// Like [`try_read_urls`], but a read failure is logged and yields no URLs.
pub async fn read_urls(path: &Path) -> Vec<String> {
    match try_read_urls(path).await {
        Ok(urls) => urls,
        Err(e) => {
            error!("{}", e);
            Vec::new()
        }
    }
}

/// Convert every URL in order. A failing (or panicking) item becomes a failed
/// record and the loop moves on; the result has one record per input URL.
pub async fn run_batch<C: Convert>(
    converter: &C,
    urls: &[String],
    options: &ConvertOptions,
    progress: &mpsc::Sender<BatchEvent>,
) -> Vec<ConversionResult> {
    let total = urls.len();
    let mut results = Vec::with_capacity(total);

    for (i, url) in urls.iter().enumerate() {
        let index = i + 1;
        let preview = preview(url, PREVIEW_LEN);
        info!("[{}/{}] Processing: {}", index, total, preview);
        let _ = progress
            .send(BatchEvent::ItemStarted {
                index,
                total,
                preview,
            })
            .await;

        let result = convert_one(converter, url, options).await;
        match (&result.title, &result.error) {
            (Some(title), _) if result.success => info!("    Success: {}", title),
            (_, Some(e)) => warn!("    Failed: {}", e),
            _ => {}
        }

        let _ = progress
            .send(BatchEvent::ItemFinished {
                index,
                total,
                result: result.clone(),
            })
            .await;
        results.push(result);
    }

    results
}

/// Run one conversion, turning an error or a panic into a failed record.
pub async fn convert_one<C: Convert>(
    converter: &C,
    url: &str,
    options: &ConvertOptions,
) -> ConversionResult {
    let outcome = AssertUnwindSafe(converter.convert(url, options))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload.as_ref()))));

    ConversionResult::from_outcome(url, outcome)
}

/// [`Convert::probe`] with the same panic capture as [`convert_one`].
pub async fn probe_one<C: Convert>(converter: &C, url: &str) -> Result<VideoInfo, ConvertError> {
    AssertUnwindSafe(converter.probe(url))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload.as_ref()))))
}

/// Write results as indented JSON, replacing the file.
pub async fn write_results(results: &[ConversionResult], path: &Path) -> Result<(), BatchError> {
    let json = serde_json::to_string_pretty(results)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| BatchError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Like [`write_results`], but failures are logged and reported as `false`.
pub async fn save_results(results: &[ConversionResult], path: &Path) -> bool {
    match write_results(results, path).await {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

/// Read back a file produced by [`write_results`].
pub async fn load_results(path: &Path) -> Result<Vec<ConversionResult>, BatchError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}

/// First `max_chars` characters of `s`, with `...` appended when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Scripted outcome for a URL handed to [`FakeConverter`].
    #[derive(Debug, Clone)]
    pub(crate) enum Script {
        Ok(&'static str),
        Fail(&'static str),
        Panic,
    }

    /// In-memory converter: outcomes are looked up by URL, unknown URLs fail.
    #[derive(Debug, Default)]
    pub(crate) struct FakeConverter {
        pub scripts: HashMap<String, Script>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeConverter {
        pub fn new(scripts: &[(&str, Script)]) -> Self {
            Self {
                scripts: scripts
                    .iter()
                    .map(|(u, s)| (u.to_string(), s.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Convert for FakeConverter {
        async fn probe(&self, url: &str) -> Result<VideoInfo, ConvertError> {
            match self.scripts.get(url) {
                Some(Script::Ok(title)) => Ok(VideoInfo {
                    title: title.to_string(),
                    duration: 60.0,
                    uploader: "Tester".to_string(),
                    thumbnail: String::new(),
                    view_count: 1,
                }),
                Some(Script::Fail(msg)) => Err(ConvertError::YtDlpFailed {
                    code: Some(1),
                    message: msg.to_string(),
                }),
                Some(Script::Panic) => panic!("probe exploded"),
                None => Err(ConvertError::OutputMissing),
            }
        }

        async fn convert(&self, url: &str, options: &ConvertOptions) -> Result<Converted, ConvertError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.scripts.get(url) {
                Some(Script::Ok(title)) => Ok(Converted {
                    title: title.to_string(),
                    filename: options.output_dir.join(format!("{title}.mp3")),
                    size: Some(1024),
                }),
                Some(Script::Fail(msg)) => Err(ConvertError::YtDlpFailed {
                    code: Some(1),
                    message: msg.to_string(),
                }),
                Some(Script::Panic) => panic!("converter exploded"),
                None => Err(ConvertError::OutputMissing),
            }
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_url_list() {
        let text = "# my playlist\n\nhttps://youtu.be/a\n   \n  https://youtu.be/b  \n#https://youtu.be/skip\nhttps://www.youtube.com/watch?v=c\n";
        assert_eq!(
            parse_url_list(text),
            vec![
                "https://youtu.be/a",
                "https://youtu.be/b",
                "https://www.youtube.com/watch?v=c",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_urls_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(
            &path,
            "# header\nhttps://youtu.be/one\n\n# comment\nhttps://youtu.be/two\n\n\nhttps://youtu.be/three\n",
        )
        .unwrap();

        let read = read_urls(&path).await;
        assert_eq!(
            read,
            vec!["https://youtu.be/one", "https://youtu.be/two", "https://youtu.be/three"]
        );
    }

    #[tokio::test]
    async fn test_read_urls_missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        assert!(read_urls(&missing).await.is_empty());
        assert!(matches!(
            try_read_urls(&missing).await,
            Err(BatchError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_batch_reflects_outcomes_in_order() {
        let converter = FakeConverter::new(&[
            ("u1", Script::Ok("First")),
            ("u2", Script::Fail("Video unavailable")),
            ("u3", Script::Ok("Third")),
            ("u4", Script::Fail("HTTP Error 403")),
        ]);
        let input = urls(&["u1", "u2", "u3", "u4"]);
        let (tx, _rx) = mpsc::channel(16);

        let results = run_batch(&converter, &input, &ConvertOptions::default(), &tx).await;

        assert_eq!(results.len(), input.len());
        let flags: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        let sources: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(sources, vec!["u1", "u2", "u3", "u4"]);

        assert_eq!(results[0].title.as_deref(), Some("First"));
        assert_eq!(results[0].error, None);
        assert!(results[1].error.as_deref().unwrap().contains("Video unavailable"));
        assert_eq!(results[1].filename, None);
        assert_eq!(results[2].title.as_deref(), Some("Third"));

        assert_eq!(*converter.calls.lock().unwrap(), input);
        assert_eq!(BatchSummary::of(&results), BatchSummary { succeeded: 2, failed: 2 });
    }

    #[tokio::test]
    async fn test_run_batch_survives_panicking_item() {
        let converter = FakeConverter::new(&[
            ("boom", Script::Panic),
            ("after", Script::Ok("Still Here")),
        ]);
        let input = urls(&["boom", "after"]);
        let (tx, _rx) = mpsc::channel(16);

        let results = run_batch(&converter, &input, &ConvertOptions::default(), &tx).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("converter exploded"));
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn test_run_batch_emits_progress() {
        let long = format!("https://www.youtube.com/watch?v={}", "x".repeat(60));
        let converter = FakeConverter::new(&[("short", Script::Ok("S"))]);
        let input = vec!["short".to_string(), long.clone()];
        let (tx, mut rx) = mpsc::channel(16);

        let results = run_batch(&converter, &input, &ConvertOptions::default(), &tx).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4);

        match &events[2] {
            BatchEvent::ItemStarted { index, total, preview } => {
                assert_eq!((*index, *total), (2, 2));
                assert_eq!(preview.chars().count(), PREVIEW_LEN + 3);
                assert!(preview.ends_with("..."));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match &events[3] {
            BatchEvent::ItemFinished { result, .. } => assert_eq!(result, &results[1]),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_batch_empty() {
        let converter = FakeConverter::default();
        let (tx, _rx) = mpsc::channel(1);
        let results = run_batch(&converter, &[], &ConvertOptions::default(), &tx).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_RESULTS_FILE);
        let results = vec![
            ConversionResult::succeeded(
                "https://youtu.be/a",
                Converted {
                    title: "Café Ñandú".to_string(),
                    filename: PathBuf::from("downloads/Café Ñandú.mp3"),
                    size: Some(4_200_000),
                },
            ),
            ConversionResult::failed("https://youtu.be/b", "Video unavailable"),
        ];

        assert!(save_results(&results, &path).await);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Café Ñandú"));
        assert!(written.contains("\n  {"));
        assert!(!written.contains("\"error\": null"));

        let loaded = load_results(&path).await.unwrap();
        assert_eq!(loaded, results);
    }

    #[tokio::test]
    async fn test_save_results_overwrites_and_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale content that is much longer than the new one").unwrap();

        assert!(save_results(&[], &path).await);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

        let unwritable = dir.path().join("no/such/dir/out.json");
        assert!(!save_results(&[], &unwritable).await);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
    }
}
