//! Command lines for the external downloader.

use std::path::Path;

/// Progress template passed to the downloader; parsed by [`super::progress`].
pub const PROGRESS_TEMPLATE: &str =
    "at:%(progress._speed_str)s eta:%(progress._eta_str)s per:%(progress._percent_str)s";

/// File name part of the output template.
pub const FILENAME_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Output template for a download directory: `<dir>/%(title)s.%(ext)s`,
/// or the bare file name template when no directory is configured.
pub fn output_template(download_dir: Option<&Path>) -> String {
    match download_dir {
        Some(dir) => dir.join(FILENAME_TEMPLATE).to_string_lossy().into_owned(),
        None => FILENAME_TEMPLATE.to_string(),
    }
}

/// Single-video metadata dump. Playlists degrade to their first-level entries.
pub fn metadata_args(url: &str) -> Vec<String> {
    vec![
        "--dump-json".to_string(),
        "--flat-playlist".to_string(),
        url.to_string(),
    ]
}

/// Whole-playlist metadata as one JSON document.
pub fn playlist_args(url: &str) -> Vec<String> {
    vec![
        "--flat-playlist".to_string(),
        "--dump-single-json".to_string(),
        url.to_string(),
    ]
}

/// Resolve the final output path without downloading.
pub fn filename_args(template: &str, format_id: &str, url: &str) -> Vec<String> {
    let mut args = vec![
        "--get-filename".to_string(),
        "-o".to_string(),
        template.to_string(),
    ];
    push_format(&mut args, format_id);
    args.push(url.to_string());
    args
}

/// The actual download, printing one machine-parsable progress line per update.
pub fn download_args(template: &str, format_id: &str, url: &str) -> Vec<String> {
    let mut args = vec![
        "--newline".to_string(),
        "--progress".to_string(),
        "--no-warnings".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        "-o".to_string(),
        template.to_string(),
    ];
    push_format(&mut args, format_id);
    args.push(url.to_string());
    args
}

fn push_format(args: &mut Vec<String>, format_id: &str) {
    if !format_id.is_empty() {
        args.extend(["-f".to_string(), format_id.to_string()]);
    }
}
