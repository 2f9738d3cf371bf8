//! URL helpers.

/// Watch-page prefix used to expand bare video identifiers.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Expands a bare video identifier into a watch URL.
///
/// Anything already starting with `http` is returned unchanged.
pub fn normalize_video_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{WATCH_URL_BASE}{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_bare_id() {
        assert_eq!(
            normalize_video_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn keeps_absolute_urls() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        assert_eq!(normalize_video_url(url), url);
        assert_eq!(normalize_video_url("http://youtu.be/x"), "http://youtu.be/x");
    }
}
