//! Line-buffered output parser. Turns raw tmux pane bytes into tagged
//! [`OutputEvent`]s on a best-effort basis; the raw byte stream remains the
//! source of truth and is always forwarded to clients unparsed as well.

use adjutant_core::types::{OutputEvent, ThinkingStatus};

/// Accumulates partial lines across chunk boundaries and emits one
/// [`OutputEvent`] per completed line.
#[derive(Default)]
pub struct OutputParser {
    pending: Vec<u8>,
}

impl OutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes, returning any events parsed from newly
    /// completed lines. Bytes after the last newline are held for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<OutputEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        loop {
            let Some(pos) = self.pending.iter().position(|&b| b == b'\n') else { break };
            let line_bytes: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let stripped = strip_ansi_escapes::strip_str(line.trim_end_matches(['\r', '\n']));
            if !stripped.is_empty() {
                events.push(classify_line(&stripped));
            }
        }
        events
    }
}

fn classify_line(line: &str) -> OutputEvent {
    let lower = line.to_lowercase();

    if let Some(tool) = extract_tool_use(line) {
        return OutputEvent::ToolUse { tool, input: serde_json::Value::Null };
    }
    if lower.contains("permission") && (lower.contains("allow") || lower.contains("approve") || lower.ends_with('?')) {
        return OutputEvent::PermissionRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            action: line.to_string(),
            details: String::new(),
        };
    }
    if lower.starts_with("error") || lower.contains("traceback") {
        return OutputEvent::Error { text: line.to_string() };
    }
    if lower.contains("thinking") {
        return OutputEvent::Status { value: ThinkingStatus::Thinking };
    }
    if lower.contains("working") || lower.contains("running") {
        return OutputEvent::Status { value: ThinkingStatus::Working };
    }

    OutputEvent::Message { text: line.to_string() }
}

/// Recognizes `tool: <name>` or `Using tool <name>` style markers used by
/// the CLI agents this bridges to.
fn extract_tool_use(line: &str) -> Option<String> {
    let lower = line.to_lowercase();
    if let Some(rest) = lower.strip_prefix("tool:") {
        return Some(rest.trim().to_string());
    }
    if let Some(idx) = lower.find("using tool ") {
        let rest = &line[idx + "using tool ".len()..];
        return Some(rest.split_whitespace().next().unwrap_or(rest).to_string());
    }
    None
}
