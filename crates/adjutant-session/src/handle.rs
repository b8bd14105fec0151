//! Dual-channel I/O for a single tmux session, mirroring the reference
//! PTY pool's reader/writer-thread shape but over a named FIFO instead of a
//! PTY master: one OS thread blocks on reads from the FIFO that `tmux
//! pipe-pane` writes into and forwards chunks into a bounded channel; another
//! drains a send queue into `tmux send-keys` invocations.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SessionError};

const CHANNEL_CAPACITY: usize = 256;

/// Create the session FIFO at `path` if it doesn't already exist.
pub fn ensure_fifo(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let c_path = std::ffi::CString::new(path.to_string_lossy().as_bytes())
        .map_err(|e| SessionError::Fifo(e.to_string()))?;
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        return Err(SessionError::Fifo(std::io::Error::last_os_error().to_string()));
    }
    Ok(())
}

/// Handle to a single tmux-backed session's raw I/O.
pub struct SessionHandle {
    /// Raw output chunks read from the FIFO (stdout/stderr merged, as tmux sees it).
    pub reader: flume::Receiver<Vec<u8>>,
    /// Queue of input to forward to the session via `tmux send-keys`.
    pub writer: flume::Sender<Vec<u8>>,
    _reader_thread: Option<std::thread::JoinHandle<()>>,
    _writer_thread: Option<std::thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Spawn the reader/writer threads for a session whose pane output is
    /// (or will be) piped into `fifo_path`, and whose input goes to the tmux
    /// target `tmux_target`.
    pub fn spawn(tmux_target: String, fifo_path: PathBuf) -> Result<Self> {
        ensure_fifo(&fifo_path)?;

        let (read_tx, read_rx) = flume::bounded::<Vec<u8>>(CHANNEL_CAPACITY);
        let reader_fifo_path = fifo_path.clone();
        let reader_thread = std::thread::spawn(move || {
            // Opening for read blocks until tmux (or something) opens the
            // write end; pipe-pane does this once `create` kicks it off.
            let file = match std::fs::File::open(&reader_fifo_path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("failed to open session fifo for reading: {e}");
                    return;
                }
            };
            let mut file = file;
            let mut buf = [0u8; 4096];
            loop {
                match file.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if read_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("session fifo reader error: {e}");
                        break;
                    }
                }
            }
        });

        let (write_tx, write_rx) = flume::bounded::<Vec<u8>>(CHANNEL_CAPACITY);
        let writer_target = tmux_target;
        let writer_thread = std::thread::spawn(move || {
            while let Ok(data) = write_rx.recv() {
                let text = String::from_utf8_lossy(&data).into_owned();
                if let Err(e) = blocking_send_keys(&writer_target, &text) {
                    warn!("failed to forward input to tmux session: {e}");
                }
            }
        });

        Ok(Self {
            reader: read_rx,
            writer: write_tx,
            _reader_thread: Some(reader_thread),
            _writer_thread: Some(writer_thread),
        })
    }

    /// Read all currently buffered output without blocking.
    pub fn try_read_all(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        while let Ok(chunk) = self.reader.try_recv() {
            buf.extend_from_slice(&chunk);
        }
        buf
    }

    /// Queue a chunk of input to be sent via `tmux send-keys`.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        self.writer
            .send(data.to_vec())
            .map_err(|e| SessionError::Tmux(format!("input queue closed: {e}")))
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish()
    }
}

fn blocking_send_keys(target: &str, text: &str) -> Result<()> {
    let status = std::process::Command::new("tmux")
        .args(["send-keys", "-t", target, "-l", text])
        .status()
        .map_err(|e| SessionError::Tmux(format!("failed to spawn tmux: {e}")))?;
    if !status.success() {
        return Err(SessionError::Tmux(format!("send-keys to {target} failed")));
    }
    let status = std::process::Command::new("tmux")
        .args(["send-keys", "-t", target, "Enter"])
        .status()
        .map_err(|e| SessionError::Tmux(format!("failed to spawn tmux: {e}")))?;
    if !status.success() {
        return Err(SessionError::Tmux(format!("send-keys Enter to {target} failed")));
    }
    Ok(())
}
