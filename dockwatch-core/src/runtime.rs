//! Runtime traits for container backends
//!
//! A runtime knows how to list workloads, snapshot their resource usage and
//! run lifecycle commands. A tailer knows how to follow one workload's logs.
//! The dashboard only ever talks to these traits; the docker CLI
//! implementation lives in the binary crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{EntityId, LifecycleAction};

/// Errors that can occur while talking to the container runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime binary could not be spawned
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The command ran but exited unsuccessfully
    #[error("`{command}` exited with {}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// The command printed something that is not UTF-8
    #[error("`{command}` produced non UTF-8 output")]
    InvalidOutput { command: String },
    /// Following logs could not be set up
    #[error("cannot tail {id}: {message}")]
    Tail { id: EntityId, message: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "signal".into(),
    }
}

/// The main runtime trait that container backends implement
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Human-readable name of this runtime
    fn name(&self) -> &'static str;

    /// Raw listing output, one `ID|Image|Status|Ports` row per workload
    async fn list_entities(&self) -> Result<String, RuntimeError>;

    /// Raw usage output, one `Name|CPUPerc|MemUsage` row per running workload
    async fn snapshot_usage(&self) -> Result<String, RuntimeError>;

    /// Run a lifecycle command and wait for it to complete
    async fn run_lifecycle(&self, action: LifecycleAction, id: &str) -> Result<(), RuntimeError>;
}

/// Which output stream a log line came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// What a tail subprocess reports back to the loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TailEventKind {
    Line { stream: LogStream, text: String },
    /// The subprocess exited on its own
    Ended { code: Option<i32> },
}

/// Output from one tail subprocess, tagged with the generation it was spawned for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailEvent {
    pub generation: u64,
    pub kind: TailEventKind,
}

/// Owned handle to a running tail subprocess
pub trait TailHandle: Send {
    /// Stop the subprocess and its readers. Must not block and must be idempotent.
    fn terminate(&mut self);
}

/// Spawns tail subprocesses
pub trait LogTailer: Send {
    fn tail(&mut self, id: &str, generation: u64) -> Result<Box<dyn TailHandle>, RuntimeError>;
}
