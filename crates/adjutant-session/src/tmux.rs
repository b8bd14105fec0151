//! Thin async wrapper around the `tmux` CLI. Every call here is a short-lived
//! subprocess invocation — no long-running child is held open by this module.
//! Output capture is handled separately via `pipe-pane` plus a FIFO (see
//! [`crate::handle`]).

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SessionError};

async fn run(args: &[&str]) -> Result<std::process::Output> {
    let output = Command::new("tmux")
        .args(args)
        .output()
        .await
        .map_err(|e| SessionError::Tmux(format!("failed to spawn tmux: {e}")))?;
    Ok(output)
}

async fn run_checked(args: &[&str]) -> Result<()> {
    let output = run(args).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(SessionError::Tmux(format!("{}: {stderr}", args.join(" "))));
    }
    Ok(())
}

/// `tmux new-session -d -s <target> -c <cwd> [cmd]`
pub async fn new_session(target: &str, cwd: &Path, cmd: Option<&str>) -> Result<()> {
    let cwd_str = cwd.to_string_lossy();
    let mut args = vec!["new-session", "-d", "-s", target, "-c", cwd_str.as_ref()];
    if let Some(cmd) = cmd {
        args.push(cmd);
    }
    debug!(target, "tmux new-session");
    run_checked(&args).await
}

/// `tmux has-session -t <target>`
pub async fn has_session(target: &str) -> Result<bool> {
    let output = run(&["has-session", "-t", target]).await?;
    Ok(output.status.success())
}

/// `tmux send-keys -t <target> -l <text>`, optionally followed by `Enter` as
/// a separate key so literal text is never misread as a key name.
pub async fn send_keys(target: &str, text: &str, enter: bool) -> Result<()> {
    run_checked(&["send-keys", "-t", target, "-l", text]).await?;
    if enter {
        run_checked(&["send-keys", "-t", target, "Enter"]).await?;
    }
    Ok(())
}

/// `tmux send-keys -t <target> C-c`
pub async fn send_interrupt(target: &str) -> Result<()> {
    run_checked(&["send-keys", "-t", target, "C-c"]).await
}

/// `tmux kill-session -t <target>`
pub async fn kill_session(target: &str) -> Result<()> {
    run_checked(&["kill-session", "-t", target]).await
}

/// `tmux capture-pane -t <target> -p` — a point-in-time snapshot of the pane,
/// used as a fallback when no client is attached and `pipe-pane` is stopped.
pub async fn capture_pane(target: &str) -> Result<String> {
    let output = run(&["capture-pane", "-t", target, "-p"]).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(SessionError::Tmux(format!("capture-pane: {stderr}")));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `tmux pipe-pane -t <target> -o 'cat >> <fifo>'` — starts streaming pane
/// output into the given FIFO. Idempotent: calling it twice toggles pipe-pane
/// off then back on, so callers must track whether it's already running.
pub async fn pipe_pane_start(target: &str, fifo_path: &Path) -> Result<()> {
    let cmd = format!("cat >> {}", fifo_path.display());
    run_checked(&["pipe-pane", "-t", target, "-o", &cmd]).await
}

/// `tmux pipe-pane -t <target>` with no command, which stops piping.
pub async fn pipe_pane_stop(target: &str) -> Result<()> {
    run_checked(&["pipe-pane", "-t", target]).await
}
