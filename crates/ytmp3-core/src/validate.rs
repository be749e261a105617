//! Substring-based URL screening

/// Watch-page and short-link forms accepted for batch work.
pub const ACCEPTED_PATTERNS: &[&str] = &["youtube.com/watch", "youtu.be/"];

/// Host fragments for the looser single-download check.
const HOST_PATTERNS: &[&str] = &["youtube.com", "youtu.be"];

/// Whether `url` contains one of the [`ACCEPTED_PATTERNS`].
pub fn is_accepted(url: &str) -> bool {
    ACCEPTED_PATTERNS.iter().any(|p| url.contains(p))
}

/// Looser check used before a single download: any mention of the host.
pub fn looks_like_video_url(url: &str) -> bool {
    HOST_PATTERNS.iter().any(|p| url.contains(p))
}

/// Split candidates into `(accepted, rejected)`, keeping input order in both.
pub fn partition_urls<I, S>(urls: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    urls.into_iter()
        .map(Into::into)
        .partition(|url: &String| is_accepted(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_urls() {
        let input = vec![
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://example.com/video",
            "https://youtu.be/PQVWiAtNX58",
            "https://www.youtube.com/playlist?list=PL123",
            "youtube.com/watch?v=abc",
        ];

        let (accepted, rejected) = partition_urls(input.clone());
        assert_eq!(
            accepted,
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "https://youtu.be/PQVWiAtNX58",
                "youtube.com/watch?v=abc",
            ]
        );
        assert_eq!(
            rejected,
            vec![
                "https://example.com/video",
                "https://www.youtube.com/playlist?list=PL123",
            ]
        );
        assert_eq!(accepted.len() + rejected.len(), input.len());
    }

    #[test]
    fn test_every_input_lands_in_exactly_one_side() {
        let input: Vec<String> = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    format!("https://youtu.be/id{i}")
                } else {
                    format!("not a url {i}")
                }
            })
            .collect();

        let (accepted, rejected) = partition_urls(input.iter().cloned());
        for url in &input {
            let hits = accepted.iter().filter(|u| *u == url).count()
                + rejected.iter().filter(|u| *u == url).count();
            assert_eq!(hits, 1, "{url}");
        }

        // Relative order is the input order filtered.
        let expected: Vec<_> = input.iter().filter(|u| is_accepted(u)).cloned().collect();
        assert_eq!(accepted, expected);
    }

    #[test]
    fn test_no_dedup_or_normalization() {
        let url = " https://youtu.be/x ";
        let (accepted, rejected) = partition_urls([url, url]);
        assert_eq!(accepted, vec![url, url]);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let (accepted, rejected) = partition_urls(Vec::<String>::new());
        assert!(accepted.is_empty());
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_looks_like_video_url() {
        assert!(looks_like_video_url("https://www.youtube.com/shorts/abc"));
        assert!(looks_like_video_url("https://youtu.be/abc"));
        assert!(!looks_like_video_url("https://vimeo.com/123"));
    }
}
