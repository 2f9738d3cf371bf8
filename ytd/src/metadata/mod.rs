//! Source metadata resolution and format catalogs.

pub mod catalog;
pub mod models;
pub mod resolver;

pub use catalog::{FormatCategory, FormatEntry, build_catalog};
pub use models::{PlaylistEntry, RawFormat, VideoMetadata};
pub use resolver::MetadataResolver;
