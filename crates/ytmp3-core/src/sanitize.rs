//! Filename cleanup for titles coming back from yt-dlp

/// Characters that are rejected by at least one common filesystem.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest file name (in characters) we hand to yt-dlp.
pub const MAX_FILENAME_LEN: usize = 200;

/// Stem used when a title cleans down to nothing.
pub const FALLBACK_STEM: &str = "audio_download";

/// Strip invalid characters, collapse whitespace and cap the length.
pub fn clean_filename(name: &str) -> String {
    clean_filename_with_limit(name, MAX_FILENAME_LEN)
}

/// Same as [`clean_filename`] with an explicit length cap. A trailing
/// extension survives truncation.
pub fn clean_filename_with_limit(name: &str, max_len: usize) -> String {
    let stripped: String = name.chars().filter(|c| !INVALID_CHARS.contains(c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let truncated = if collapsed.chars().count() > max_len {
        let (stem, ext) = split_extension(&collapsed);
        let ext_len = ext.chars().count();
        if ext_len >= max_len {
            collapsed.chars().take(max_len).collect()
        } else {
            let mut out: String = stem.chars().take(max_len - ext_len).collect();
            out.push_str(ext);
            out
        }
    } else {
        collapsed
    };

    let cleaned = truncated.trim();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Split `name` into stem and extension (including the dot). Leading dots
/// belong to the stem, so `.bashrc` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(idx) => name.split_at(leading_dots + idx),
        None => (name, ""),
    }
}
