//! Core of the dockwatch dashboard: runtime abstraction, sampling, bounded
//! usage history, table selection and log-stream supervision.
//!
//! Everything here is UI-agnostic. The binary crate owns the terminal and
//! the docker subprocesses.

pub mod config;
pub mod logstream;
pub mod model;
pub mod parse;
pub mod runtime;
pub mod sampler;
pub mod selection;
pub mod timeseries;

// Refresh loop state, driven by the binary's event loop
pub mod orchestrator;
