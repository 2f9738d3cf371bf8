use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ytd", author, version, about, long_about = None)]
pub struct Args {
    /// Database URL [env: DATABASE_URL]
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Downloader binary [env: YTD_DOWNLOADER]
    #[arg(long, global = true)]
    pub downloader: Option<String>,

    /// Directory for rolling log files [env: YTD_LOG_DIR]
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show metadata and the selectable formats of a video
    Info {
        /// Video URL or bare video id
        url: String,

        /// Print the full metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the entries of a playlist
    Playlist {
        url: String,

        #[arg(long)]
        json: bool,
    },

    /// Download one or more videos
    Download {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Format id, best available when omitted
        #[arg(short = 'f', long = "format", default_value = "")]
        format_id: String,

        /// Task id, only valid with a single URL
        #[arg(long)]
        id: Option<String>,

        /// Title to record instead of the resolved one
        #[arg(long)]
        title: Option<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List completed downloads
    History {
        #[arg(long)]
        json: bool,
    },

    /// Delete a history entry
    Delete {
        id: String,

        /// Also delete the downloaded file
        #[arg(long)]
        remove_file: bool,
    },

    /// Read or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print one setting, or all of them
    Get { key: Option<String> },
    /// Store a setting
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_args() {
        let args = Args::parse_from(["ytd", "-v", "download", "abc", "def", "-f", "22"]);
        assert!(args.verbose);
        match args.command {
            Commands::Download {
                urls,
                format_id,
                id,
                ..
            } => {
                assert_eq!(urls, vec!["abc", "def"]);
                assert_eq!(format_id, "22");
                assert_eq!(id, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["ytd", "-v", "-q", "history"]).is_err());
    }

    #[test]
    fn test_settings_set() {
        let args = Args::parse_from(["ytd", "settings", "set", "max_concurrent", "5"]);
        assert!(matches!(
            args.command,
            Commands::Settings {
                action: SettingsAction::Set { ref key, ref value }
            } if key == "max_concurrent" && value == "5"
        ));
    }
}
