//! AG-UI event stream decoding.
//!
//! The gateway forwards upstream bytes untouched; a [`StreamTap`] watches the same bytes,
//! decodes the Server-Sent Events and logs run and tool-call lifecycle with timings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// Longest tool result or argument string written to the log.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Bytes of an unterminated event the decoder holds before giving up on it.
pub const MAX_PENDING_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFinished {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageContent {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub delta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallStart {
    pub tool_call_id: String,
    pub tool_call_name: String,
    #[serde(default)]
    pub parent_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallArgs {
    pub tool_call_id: String,
    #[serde(default)]
    pub delta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallEnd {
    pub tool_call_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_call_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub snapshot: Value,
}

/// Events the bridge cares about. Everything else decodes to `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AguiEvent {
    RunStarted(RunStarted),
    RunFinished(RunFinished),
    RunError(RunError),
    TextMessageContent(TextMessageContent),
    ToolCallStart(ToolCallStart),
    ToolCallArgs(ToolCallArgs),
    ToolCallEnd(ToolCallEnd),
    ToolCallResult(ToolCallResult),
    StateSnapshot(StateSnapshot),
    #[serde(other)]
    Other,
}

impl AguiEvent {
    /// Decode one SSE `data:` payload. Non-JSON payloads and unknown shapes yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }
}

/// Incremental `text/event-stream` splitter: feed raw chunks, get complete `data` payloads.
///
/// A pending event larger than [`MAX_PENDING_BYTES`] is dropped; decoding resumes at the
/// next blank line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already searched for a blank line.
    scanned: usize,
    overflowed: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        let mut out = Vec::new();
        loop {
            // a separator may straddle the previous chunk boundary
            let from = self.scanned.saturating_sub(1);
            let Some(offset) = self.buf[from..].windows(2).position(|w| w == b"\n\n") else {
                self.scanned = self.buf.len();
                break;
            };
            let pos = from + offset;
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            self.scanned = 0;
            if let Some(data) = Self::data_of(&block[..pos]) {
                out.push(data);
            }
        }
        if self.buf.len() > MAX_PENDING_BYTES {
            if !self.overflowed {
                self.overflowed = true;
                tracing::warn!(
                    target: "agui::events",
                    pending = self.buf.len(),
                    "Upstream event exceeds {} bytes; dropping it from the event log",
                    MAX_PENDING_BYTES
                );
            }
            self.buf.clear();
            self.scanned = 0;
        }
        out
    }

    fn data_of(block: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(block);
        let lines: Vec<&str> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

struct InFlight {
    name: String,
    started: Instant,
}

/// Name and accumulated JSON arguments of a tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallRecord {
    pub name: String,
    pub args: String,
}

impl ToolCallRecord {
    /// Arguments decoded as JSON; partial or broken argument text gives `Null`.
    pub fn args_json(&self) -> Value {
        serde_json::from_str(&self.args).unwrap_or(Value::Null)
    }
}

/// Logs tool-call lifecycle: start, arguments, completion time and (truncated) result.
#[derive(Default)]
pub struct ToolCallTracer {
    in_flight: HashMap<String, InFlight>,
    calls: HashMap<String, ToolCallRecord>,
    completed: usize,
}

impl ToolCallTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool calls seen to completion so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// A tool call seen on this stream, finished or not.
    pub fn call(&self, tool_call_id: &str) -> Option<&ToolCallRecord> {
        self.calls.get(tool_call_id)
    }

    pub fn observe(&mut self, event: &AguiEvent) {
        match event {
            AguiEvent::RunStarted(run) => {
                tracing::info!(target: "agui::events", thread = %run.thread_id, run = %run.run_id, "Run started");
            }
            AguiEvent::RunFinished(run) => {
                tracing::info!(target: "agui::events", run = %run.run_id, tool_calls = self.completed, "Run finished");
            }
            AguiEvent::RunError(err) => {
                tracing::warn!(target: "agui::events", code = ?err.code, "Run error: {}", err.message);
            }
            AguiEvent::ToolCallStart(start) => {
                tracing::info!(target: "agui::events", "Tool call started: {}", start.tool_call_name);
                self.calls.insert(
                    start.tool_call_id.clone(),
                    ToolCallRecord {
                        name: start.tool_call_name.clone(),
                        args: String::new(),
                    },
                );
                self.in_flight.insert(
                    start.tool_call_id.clone(),
                    InFlight {
                        name: start.tool_call_name.clone(),
                        started: Instant::now(),
                    },
                );
            }
            AguiEvent::ToolCallArgs(args) => {
                if let Some(record) = self.calls.get_mut(&args.tool_call_id) {
                    record.args.push_str(&args.delta);
                }
            }
            AguiEvent::ToolCallEnd(end) => {
                if let Some(call) = self.in_flight.remove(&end.tool_call_id) {
                    self.completed += 1;
                    let args = self
                        .calls
                        .get(&end.tool_call_id)
                        .map_or("", |record| record.args.as_str());
                    tracing::info!(target: "agui::events", "  Arguments: {}", preview(args));
                    tracing::info!(
                        target: "agui::events",
                        "Tool call completed: {} (took {:.3}s)",
                        call.name,
                        call.started.elapsed().as_secs_f64()
                    );
                }
            }
            AguiEvent::ToolCallResult(result) => {
                let name = self
                    .calls
                    .get(&result.tool_call_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or("unknown");
                let text = match &result.content {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                tracing::info!(target: "agui::events", "  Result ({}): {}", name, preview(&text));
            }
            _ => {}
        }
    }
}

/// Decoder plus tracer for one proxied response.
#[derive(Default)]
pub struct StreamTap {
    decoder: SseDecoder,
    tracer: ToolCallTracer,
}

impl StreamTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and traces one chunk; returns the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<AguiEvent> {
        let events: Vec<AguiEvent> = self
            .decoder
            .push(chunk)
            .iter()
            .filter_map(|data| AguiEvent::parse(data))
            .collect();
        for event in &events {
            self.tracer.observe(event);
        }
        events
    }

    pub fn tracer(&self) -> &ToolCallTracer {
        &self.tracer
    }
}

/// First [`LOG_PREVIEW_CHARS`] characters of `s`, with "..." when cut.
pub fn preview(s: &str) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
