use std::sync::Arc;

use tracing::warn;

use crate::model::{Entity, Sample};
use crate::parse::{parse_entities, parse_samples};
use crate::runtime::ContainerRuntime;

/// Turns raw runtime output into typed records.
///
/// Neither call ever fails: a runtime error becomes the sentinel entity
/// (listing) or an empty set (usage). Staleness is fixed by the next tick.
#[derive(Clone)]
pub struct Sampler {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Sampler {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    pub async fn fetch_entities(&self) -> Vec<Entity> {
        match self.runtime.list_entities().await {
            Ok(out) => parse_entities(&out),
            Err(e) => {
                warn!(runtime = self.runtime.name(), error = %e, "entity listing failed");
                vec![Entity::unavailable()]
            }
        }
    }

    pub async fn fetch_samples(&self) -> Vec<Sample> {
        match self.runtime.snapshot_usage().await {
            Ok(out) => parse_samples(&out),
            Err(e) => {
                warn!(runtime = self.runtime.name(), error = %e, "usage snapshot failed");
                Vec::new()
            }
        }
    }
}
