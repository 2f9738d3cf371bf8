//! Metadata resolution through the external downloader.
//!
//! Resolution never fails loudly: a tool failure or unreadable output is
//! logged and reported as "no metadata".

use std::sync::Arc;

use tracing::{debug, warn};

use super::catalog::build_catalog;
use super::models::{PlaylistEntry, RawPlaylist, VideoMetadata};
use crate::downloader::{ProcessRunner, ytdlp};
use crate::utils::url::normalize_video_url;

pub struct MetadataResolver {
    runner: Arc<dyn ProcessRunner>,
}

impl MetadataResolver {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Resolve single-video metadata, with a format catalog when the source
    /// lists formats.
    ///
    /// Bare video ids are expanded to a watch URL first. For playlist URLs
    /// the first flat entry is returned.
    pub async fn resolve(&self, url: &str) -> Option<VideoMetadata> {
        let url = normalize_video_url(url);
        let stdout = match self.runner.capture(&ytdlp::metadata_args(&url)).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(%url, error = %e, "Metadata resolution failed");
                return None;
            }
        };

        // --dump-json prints one document per line; the first one describes the source.
        let first = serde_json::Deserializer::from_slice(&stdout)
            .into_iter::<VideoMetadata>()
            .next();
        let mut metadata = match first {
            Some(Ok(metadata)) => metadata,
            Some(Err(e)) => {
                warn!(%url, error = %e, "Unreadable metadata");
                return None;
            }
            None => {
                warn!(%url, "Downloader printed no metadata");
                return None;
            }
        };

        metadata.requested_url = url;
        if let Some(formats) = &metadata.formats {
            let catalog = build_catalog(formats);
            debug!(
                raw = formats.len(),
                selectable = catalog.len(),
                "Built format catalog"
            );
            metadata.processed_formats = Some(catalog);
        }
        Some(metadata)
    }

    /// Resolve the flat entries of a playlist.
    ///
    /// All-or-nothing: either every entry is returned or `None`. Entry URLs
    /// that are bare ids are expanded; non-string thumbnails become empty.
    pub async fn resolve_list(&self, url: &str) -> Option<Vec<PlaylistEntry>> {
        let stdout = match self.runner.capture(&ytdlp::playlist_args(url)).await {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(%url, error = %e, "Playlist resolution failed");
                return None;
            }
        };

        let playlist: RawPlaylist = match serde_json::from_slice(&stdout) {
            Ok(playlist) => playlist,
            Err(e) => {
                warn!(%url, error = %e, "Unreadable playlist");
                return None;
            }
        };

        let entries: Vec<_> = playlist
            .entries
            .into_iter()
            .map(|entry| {
                let url = entry
                    .url
                    .or(entry.id)
                    .filter(|u| !u.is_empty())
                    .map(|u| normalize_video_url(&u))
                    .unwrap_or_default();
                PlaylistEntry {
                    title: entry.title.unwrap_or_default(),
                    url,
                    thumbnail: entry.thumbnail.unwrap_or_default(),
                }
            })
            .collect();

        debug!(%url, count = entries.len(), "Resolved playlist");
        Some(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::ProcessOutput;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Runner that answers every capture with a canned result.
    struct CannedRunner {
        stdout: Option<&'static str>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl CannedRunner {
        fn ok(stdout: &'static str) -> Arc<Self> {
            Arc::new(Self {
                stdout: Some(stdout),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                stdout: None,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProcessRunner for CannedRunner {
        fn program(&self) -> &str {
            "canned"
        }

        async fn run(&self, _args: &[String]) -> Result<ProcessOutput> {
            Err(Error::Other("not streamed".into()))
        }

        async fn capture(&self, args: &[String]) -> Result<Vec<u8>> {
            self.calls.lock().push(args.to_vec());
            match self.stdout {
                Some(out) => Ok(out.as_bytes().to_vec()),
                None => Err(Error::ToolFailed {
                    tool: "canned".into(),
                    code: Some(1),
                    stderr: "ERROR: unsupported URL".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_builds_catalog() {
        let runner = CannedRunner::ok(
            r#"{"id":"abc","title":"Clip","formats":[
                {"format_id":"sb1","ext":"mhtml","vcodec":"none","acodec":"none","format_note":"storyboard"},
                {"format_id":"140","ext":"m4a","vcodec":"none","acodec":"mp4a","format_note":"medium"},
                {"format_id":"22","ext":"mp4","vcodec":"avc1","acodec":"mp4a","resolution":"1280x720"}
            ]}"#,
        );
        let resolver = MetadataResolver::new(runner.clone());

        let meta = resolver.resolve("abc").await.unwrap();
        assert_eq!(meta.requested_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(meta.formats.as_ref().map(Vec::len), Some(3));

        let ids: Vec<_> = meta
            .processed_formats
            .unwrap()
            .into_iter()
            .map(|e| e.format_id)
            .collect();
        assert_eq!(ids, vec!["140", "22"]);

        let calls = runner.calls.lock();
        assert_eq!(
            calls[0].last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn test_resolve_takes_first_document() {
        let runner = CannedRunner::ok("{\"id\":\"one\"}\n{\"id\":\"two\"}\n");
        let meta = MetadataResolver::new(runner).resolve("https://x/list").await.unwrap();
        assert_eq!(meta.id.as_deref(), Some("one"));
        assert!(meta.processed_formats.is_none());
    }

    #[tokio::test]
    async fn test_resolve_failures_yield_none() {
        assert!(
            MetadataResolver::new(CannedRunner::failing())
                .resolve("https://x/v")
                .await
                .is_none()
        );
        assert!(
            MetadataResolver::new(CannedRunner::ok("not json"))
                .resolve("https://x/v")
                .await
                .is_none()
        );
        assert!(
            MetadataResolver::new(CannedRunner::ok(""))
                .resolve("https://x/v")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_resolve_list_normalizes_entries() {
        let runner = CannedRunner::ok(
            r#"{"entries":[
                {"title":"First","url":"abc","thumbnail":"https://i/1.jpg"},
                {"title":"Second","url":"https://www.youtube.com/watch?v=def","thumbnail":[{"url":"x"}]},
                {"id":"ghi","title":"Third"}
            ]}"#,
        );
        let entries = MetadataResolver::new(runner)
            .resolve_list("https://x/playlist")
            .await
            .unwrap();

        assert_eq!(
            entries,
            vec![
                PlaylistEntry {
                    title: "First".into(),
                    url: "https://www.youtube.com/watch?v=abc".into(),
                    thumbnail: "https://i/1.jpg".into(),
                },
                PlaylistEntry {
                    title: "Second".into(),
                    url: "https://www.youtube.com/watch?v=def".into(),
                    thumbnail: String::new(),
                },
                PlaylistEntry {
                    title: "Third".into(),
                    url: "https://www.youtube.com/watch?v=ghi".into(),
                    thumbnail: String::new(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_list_tolerates_null_entries() {
        let runner = CannedRunner::ok(r#"{"entries":[{"title":"A","url":"abc"},null]}"#);
        let entries = MetadataResolver::new(runner)
            .resolve_list("https://x/playlist")
            .await
            .unwrap();
        assert_eq!(
            entries,
            vec![PlaylistEntry {
                title: "A".into(),
                url: "https://www.youtube.com/watch?v=abc".into(),
                thumbnail: String::new(),
            }]
        );

        let entries = MetadataResolver::new(CannedRunner::ok(r#"{"entries":null}"#))
            .resolve_list("https://x/playlist")
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_list_is_all_or_nothing() {
        let truncated = CannedRunner::ok(r#"{"entries":[{"title":"First","url":"abc"},"#);
        assert!(
            MetadataResolver::new(truncated)
                .resolve_list("https://x/playlist")
                .await
                .is_none()
        );
        assert!(
            MetadataResolver::new(CannedRunner::failing())
                .resolve_list("https://x/playlist")
                .await
                .is_none()
        );
    }
}
