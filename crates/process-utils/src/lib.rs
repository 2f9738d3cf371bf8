//! Process helpers for launching the external downloader in the background.

use std::ffi::OsStr;
use std::process::Stdio;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self) -> &mut Self;
}

impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

/// Stdio wiring used for tool invocations whose output is consumed by us.
pub trait PipedOutputExt {
    /// Detach stdin and pipe both stdout and stderr back to the parent.
    fn piped_output(&mut self) -> &mut Self;
}

impl PipedOutputExt for tokio::process::Command {
    fn piped_output(&mut self) -> &mut Self {
        self.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
    }
}

/// Create a `tokio::process::Command` for a background tool.
///
/// The child never opens a console window on Windows, has its output piped
/// and is killed if its handle is dropped before it exits.
pub fn tool_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window().piped_output().kill_on_drop(true);
    cmd
}
