use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})$")
        .expect("static YouTube URL pattern")
});

/// Pre-submission shape check for YouTube watch and short links.
///
/// Pure: no network access. The Media Encoder never re-checks this.
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// The 11-character video id of a valid YouTube URL.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_URL
        .captures(url)
        .and_then(|caps| caps.get(4))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_watch_and_short_links() {
        assert!(is_valid_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(is_valid_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_valid_youtube_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_youtube_url("http://youtu.be/a_b-c_d-e_f"));
    }

    #[test]
    fn test_rejects_wrong_id_length() {
        assert!(!is_valid_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXc"
        ));
        assert!(!is_valid_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQQ"
        ));
        assert!(!is_valid_youtube_url("https://youtu.be/dQw4w9WgXc"));
    }

    #[test]
    fn test_rejects_other_hosts_and_extras() {
        assert!(!is_valid_youtube_url("https://vimeo.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_valid_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"
        ));
        assert!(!is_valid_youtube_url("ftp://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_valid_youtube_url(""));
    }

    #[test]
    fn test_video_id() {
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_video_id("https://youtu.be/short"), None);
    }
}
