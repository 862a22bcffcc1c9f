//! Docker command-line backends for the core runtime traits

mod docker;
mod tail;

pub use docker::DockerCli;
pub use tail::DockerTailer;
