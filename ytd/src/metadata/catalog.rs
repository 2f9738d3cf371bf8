//! Format catalog.
//!
//! Turns the downloader's raw format listing into human-readable choices.
//! Each entry is classified by the first matching rule:
//!
//! 1. both video and audio codecs present: best merged stream
//! 2. no video codec: audio only
//! 3. a 2160 or 4320 line resolution: ultra-high-definition
//! 4. otherwise: plain video
//!
//! Storyboard formats and formats whose note is null are dropped.

use serde::{Deserialize, Serialize};

use super::models::RawFormat;

/// Codec value the downloader uses for an absent stream.
const NO_CODEC: &str = "none";

/// Stringified null some extractors emit for missing notes.
const NULL_TEXT: &str = "null";

/// Substring marking storyboard (thumbnail sheet) formats.
const STORYBOARD_MARKER: &str = "sb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCategory {
    BestMerged,
    AudioOnly,
    UltraHd,
    PlainVideo,
}

impl FormatCategory {
    /// Classify a raw format. A missing codec counts as present.
    pub fn classify(format: &RawFormat) -> Self {
        let has_video = format.vcodec.as_deref() != Some(NO_CODEC);
        let has_audio = format.acodec.as_deref() != Some(NO_CODEC);

        if has_video && has_audio {
            Self::BestMerged
        } else if !has_video {
            Self::AudioOnly
        } else if format
            .resolution
            .as_deref()
            .is_some_and(|r| r.contains("2160") || r.contains("4320"))
        {
            Self::UltraHd
        } else {
            Self::PlainVideo
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BestMerged => "Best merged stream",
            Self::AudioOnly => "Audio only",
            Self::UltraHd => "Ultra-high-definition",
            Self::PlainVideo => "Plain video",
        }
    }
}

/// A selectable format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub format_id: String,
    pub category: FormatCategory,
    /// `<category> | ID: <id> | <ext> | <note>`, padded into columns.
    pub label: String,
}

/// Build the catalog for a format listing, preserving input order.
pub fn build_catalog(formats: &[RawFormat]) -> Vec<FormatEntry> {
    formats.iter().filter_map(catalog_entry).collect()
}

fn catalog_entry(format: &RawFormat) -> Option<FormatEntry> {
    let format_id = format.format_id.as_deref().filter(|id| !id.is_empty())?;
    if format_id.contains(STORYBOARD_MARKER) {
        return None;
    }
    let note = describe(format)?;
    let category = FormatCategory::classify(format);
    let ext = format.ext.as_deref().unwrap_or_default();

    Some(FormatEntry {
        format_id: format_id.to_string(),
        category,
        label: format!(
            "{:<21} | ID: {:<5} | {:<5} | {}",
            category.label(),
            format_id,
            ext,
            note
        ),
    })
}

/// The format note, falling back to the resolution when the note is null
/// or empty. `None` when the result is still null.
fn describe(format: &RawFormat) -> Option<&str> {
    let note = format
        .format_note
        .as_deref()
        .filter(|n| !n.is_empty() && *n != NULL_TEXT)
        .or(format.resolution.as_deref())?;
    (note != NULL_TEXT).then_some(note)
}
