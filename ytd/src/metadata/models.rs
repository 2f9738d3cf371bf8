//! Downloader JSON models.
//!
//! The downloader's JSON schema is loose: fields go missing, change type or
//! come back null. Every field is optional and read leniently; anything not
//! modelled is kept in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::catalog::FormatEntry;
use crate::utils::json::{lenient_string, lenient_text};

/// One entry of a video's `formats` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFormat {
    #[serde(default, deserialize_with = "lenient_text")]
    pub format_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub resolution: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vcodec: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub acodec: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub format_note: Option<String>,
}

/// Single-video metadata as dumped by the downloader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub webpage_url: Option<String>,
    /// URL this metadata was resolved from, after bare-id expansion.
    #[serde(default, skip_deserializing)]
    pub requested_url: String,
    /// Raw format listing. `None` when the dump carried no list.
    #[serde(default, deserialize_with = "lenient_formats")]
    pub formats: Option<Vec<RawFormat>>,
    /// Labelled catalog derived from `formats`.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub processed_formats: Option<Vec<FormatEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One playlist entry, ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
}

/// Raw flat-playlist entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPlaylistEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: Option<String>,
}

/// Flat playlist document.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPlaylist {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub entries: Vec<RawPlaylistEntry>,
}

/// A null or non-array `entries` is an empty listing and `null` items are
/// skipped. Any other item must parse as an entry.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<RawPlaylistEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        if item.is_null() {
            debug!("Skipping null playlist entry");
            continue;
        }
        entries.push(RawPlaylistEntry::deserialize(item).map_err(serde::de::Error::custom)?);
    }
    Ok(entries)
}

/// `formats` is only honoured when it is an array; non-object items are skipped.
fn lenient_formats<'de, D>(deserializer: D) -> Result<Option<Vec<RawFormat>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };

    let formats = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => serde_json::from_value::<RawFormat>(item).ok(),
            other => {
                debug!(item = %other, "Skipping non-object format entry");
                None
            }
        })
        .collect();
    Ok(Some(formats))
}
