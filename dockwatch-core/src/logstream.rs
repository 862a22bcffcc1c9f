//! Log tail supervision
//!
//! The supervisor owns at most one tail subprocess at a time. Every
//! transition that replaces or drops the live handle terminates it first, and
//! each handle carries a generation number so that output still in flight
//! from a terminated handle is discarded instead of reaching the sink.

use std::collections::VecDeque;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::model::{EntityId, LifecycleAction};
use crate::runtime::{LogStream, LogTailer, TailEvent, TailEventKind, TailHandle};

pub const DEFAULT_LOG_CAPACITY: usize = 5_000;
pub const ERROR_PREFIX: &str = "Error: ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Error,
    Info,
}

#[derive(Clone, Debug)]
pub struct LogLine {
    pub at: SystemTime,
    pub kind: LineKind,
    pub text: String,
}

impl LogLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            at: SystemTime::now(),
            kind,
            text: text.into(),
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(LineKind::Output, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(LineKind::Info, text)
    }

    pub fn from_stream(stream: LogStream, text: impl Into<String>) -> Self {
        match stream {
            LogStream::Stdout => Self::output(text),
            LogStream::Stderr => Self::error(text),
        }
    }

    /// Text as shown in the log panel; error lines carry the `Error: ` prefix
    pub fn display(&self) -> String {
        match self.kind {
            LineKind::Error => format!("{}{}", ERROR_PREFIX, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Bounded log panel content.
///
/// `revision` changes on every mutation so the renderer can tell when the
/// panel needs repainting.
#[derive(Debug)]
pub struct LogSink {
    cap: usize,
    lines: VecDeque<LogLine>,
    revision: u64,
}

impl LogSink {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            lines: VecDeque::new(),
            revision: 0,
        }
    }

    pub fn push(&mut self, line: LogLine) {
        self.lines.push_back(line);
        while self.lines.len() > self.cap {
            self.lines.pop_front();
        }
        self.revision += 1;
    }

    /// Drop everything and start over with `line`
    pub fn replace(&mut self, line: LogLine) {
        self.lines.clear();
        self.push(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.revision += 1;
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &LogLine> + ExactSizeIterator {
        self.lines.iter()
    }

    /// Last `n` lines, oldest first
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &LogLine> {
        self.lines.iter().skip(self.lines.len().saturating_sub(n))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Full panel content, one displayed line per row
    pub fn content(&self) -> String {
        self.lines
            .iter()
            .map(LogLine::display)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

struct ActiveStream {
    entity: EntityId,
    generation: u64,
    handle: Box<dyn TailHandle>,
    /// The subprocess exited on its own; the state stays `Streaming` until an
    /// explicit transition
    ended: bool,
}

enum StreamState {
    Idle,
    Streaming(ActiveStream),
}

pub struct LogStreamSupervisor {
    tailer: Box<dyn LogTailer>,
    state: StreamState,
    next_generation: u64,
    sink: LogSink,
}

impl LogStreamSupervisor {
    pub fn new(tailer: Box<dyn LogTailer>) -> Self {
        Self::with_capacity(tailer, DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(tailer: Box<dyn LogTailer>, cap: usize) -> Self {
        Self {
            tailer,
            state: StreamState::Idle,
            next_generation: 0,
            sink: LogSink::new(cap),
        }
    }

    /// Tail `id`, replacing whatever is streaming now (even the same id)
    pub fn start(&mut self, id: &str) {
        self.terminate_active();
        self.sink
            .replace(LogLine::info(format!("Fetching logs for {}...", id)));

        self.next_generation += 1;
        let generation = self.next_generation;
        match self.tailer.tail(id, generation) {
            Ok(handle) => {
                debug!(entity = id, generation, "log stream started");
                self.state = StreamState::Streaming(ActiveStream {
                    entity: id.to_string(),
                    generation,
                    handle,
                    ended: false,
                });
            }
            Err(e) => {
                warn!(entity = id, error = %e, "log stream failed to start");
                self.sink.push(LogLine::error(e.to_string()));
            }
        }
    }

    /// Stop the live tail, if any
    pub fn cancel(&mut self) {
        if let Some(entity) = self.terminate_active() {
            self.sink
                .push(LogLine::info(format!("Stopped following logs for {}.", entity)));
        }
    }

    /// Terminate the live tail on quit
    pub fn shutdown(&mut self) {
        self.terminate_active();
    }

    /// Route one tail event. Returns `false` when the event belongs to a
    /// handle that is no longer live.
    pub fn deliver(&mut self, event: TailEvent) -> bool {
        let StreamState::Streaming(active) = &mut self.state else {
            debug!(generation = event.generation, "tail event while idle dropped");
            return false;
        };
        if active.generation != event.generation {
            debug!(
                generation = event.generation,
                live = active.generation,
                "stale tail event dropped"
            );
            return false;
        }

        match event.kind {
            TailEventKind::Line { stream, text } => {
                self.sink.push(LogLine::from_stream(stream, text));
            }
            TailEventKind::Ended { code } => {
                if active.ended {
                    return false;
                }
                active.ended = true;
                let how = match code {
                    Some(c) => format!("exit status {}", c),
                    None => "terminated".to_string(),
                };
                self.sink.push(LogLine::error(format!(
                    "log stream for {} ended ({})",
                    active.entity, how
                )));
            }
        }
        true
    }

    /// React to a completed lifecycle command against `id`
    pub fn on_lifecycle_completed(
        &mut self,
        action: LifecycleAction,
        id: &str,
        result: &Result<(), String>,
    ) {
        match (action, result) {
            (_, Err(message)) => {
                self.sink
                    .push(LogLine::error(format!("{} {} failed: {}", action, id, message)));
            }
            (LifecycleAction::Delete, Ok(())) => {
                if self.current_entity() != Some(id) {
                    debug!(entity = id, "deleted entity is not being followed");
                    return;
                }
                self.terminate_active();
                self.sink.clear();
            }
            (_, Ok(())) => self.start(id),
        }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Entity being followed, if any
    pub fn current_entity(&self) -> Option<&str> {
        match &self.state {
            StreamState::Streaming(active) => Some(active.entity.as_str()),
            StreamState::Idle => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, StreamState::Streaming(_))
    }

    /// Whether the live subprocess exited on its own
    pub fn has_ended(&self) -> bool {
        matches!(&self.state, StreamState::Streaming(active) if active.ended)
    }

    pub fn generation(&self) -> Option<u64> {
        match &self.state {
            StreamState::Streaming(active) => Some(active.generation),
            StreamState::Idle => None,
        }
    }

    fn terminate_active(&mut self) -> Option<EntityId> {
        match std::mem::replace(&mut self.state, StreamState::Idle) {
            StreamState::Streaming(mut active) => {
                active.handle.terminate();
                debug!(
                    entity = %active.entity,
                    generation = active.generation,
                    "log stream terminated"
                );
                Some(active.entity)
            }
            StreamState::Idle => None,
        }
    }
}

impl Drop for LogStreamSupervisor {
    fn drop(&mut self) {
        self.terminate_active();
    }
}
