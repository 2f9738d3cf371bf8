//! External downloader integration.
//!
//! The downloader is a black box invoked as a subprocess. This module builds
//! its command lines, runs it with merged output and parses its progress.

mod output;
pub mod progress;
pub mod runner;
pub mod ytdlp;

pub use output::RecordReader;
pub use progress::{ProgressFields, ProgressSample, parse_fields, parse_progress};
pub use runner::{CommandRunner, ProcessExit, ProcessOutput, ProcessRunner};
