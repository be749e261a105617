//! Terminal rendering shared by the commands

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use ytmp3_core::batch::ConversionResult;

/// How many rejected URLs are listed before "...and N more".
pub const REJECTED_SHOWN: usize = 5;

pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}") {
        pb.set_style(style.tick_chars("=>-"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn batch_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {bar:30.cyan/blue} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// One line per finished item, as printed under the batch bar.
pub fn item_line(result: &ConversionResult) -> String {
    if result.success {
        format!(
            "  Done: {}",
            result.title.as_deref().unwrap_or("Unknown")
        )
    } else {
        format!(
            "  Failed: {} - {}",
            result.url,
            result.error.as_deref().unwrap_or("Unknown error")
        )
    }
}

/// Lines describing URLs dropped by validation.
pub fn rejected_lines(rejected: &[String]) -> Vec<String> {
    let mut lines = vec![format!("Found {} invalid URLs:", rejected.len())];
    lines.extend(rejected.iter().take(REJECTED_SHOWN).map(|u| format!("  {u}")));
    if rejected.len() > REJECTED_SHOWN {
        lines.push(format!("  ...and {} more", rejected.len() - REJECTED_SHOWN));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_lines_caps_listing() {
        let rejected: Vec<String> = (0..8).map(|i| format!("bad{i}")).collect();
        let lines = rejected_lines(&rejected);
        assert_eq!(lines.first().unwrap(), "Found 8 invalid URLs:");
        assert_eq!(lines.len(), 1 + REJECTED_SHOWN + 1);
        assert_eq!(lines.last().unwrap(), "  ...and 3 more");

        let few = rejected_lines(&rejected[..2]);
        assert_eq!(few.len(), 3);
    }

    #[test]
    fn test_item_line() {
        let failed = ConversionResult::failed("https://youtu.be/x", "Video unavailable");
        assert_eq!(item_line(&failed), "  Failed: https://youtu.be/x - Video unavailable");
    }
}
