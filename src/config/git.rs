//! Bounded `git` invocations.

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time;

/// Limit for `git ls-remote`.
pub const LS_REMOTE_TIMEOUT: Duration = Duration::from_secs(60);
/// Limit for one configuration clone attempt.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// A non-interactive `git` command with all output captured.
pub fn command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `cmd` to completion, killing it once `limit` elapses.
///
/// Running out of time is reported as [`io::ErrorKind::TimedOut`].
pub async fn output_within(cmd: &mut Command, limit: Duration) -> io::Result<Output> {
    match time::timeout(limit, cmd.output()).await {
        Ok(output) => output,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("git did not finish within {}s", limit.as_secs()),
        )),
    }
}
