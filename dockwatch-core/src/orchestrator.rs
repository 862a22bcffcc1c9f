//! Refresh orchestration
//!
//! The orchestrator is owned by the single loop task. It spawns the runtime
//! calls as independent tasks and applies their results, in issue order per
//! structure, when they come back over the refresh channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::logstream::LogStreamSupervisor;
use crate::model::{Entity, EntityId, LifecycleAction, OperatorInput, Sample};
use crate::runtime::{LogTailer, TailEvent};
use crate::sampler::Sampler;
use crate::selection::SelectionController;
use crate::timeseries::TimeSeriesStore;

/// Completions reported back to the loop
#[derive(Clone, Debug)]
pub enum RefreshEvent {
    Entities {
        seq: u64,
        entities: Vec<Entity>,
    },
    Samples {
        seq: u64,
        label: String,
        samples: Vec<Sample>,
    },
    LifecycleCompleted {
        action: LifecycleAction,
        id: EntityId,
        result: Result<(), String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Issue-order bookkeeping for one update stream: a completion older than
/// the last applied one is stale and gets dropped.
#[derive(Debug, Default)]
struct UpdateOrder {
    issued: u64,
    applied: u64,
}

impl UpdateOrder {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }
}

/// Wall-clock tick label
pub fn tick_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

pub struct RefreshOrchestrator {
    sampler: Sampler,
    events: mpsc::UnboundedSender<RefreshEvent>,
    period: Duration,
    store: TimeSeriesStore,
    selection: SelectionController,
    logs: LogStreamSupervisor,
    entity_order: UpdateOrder,
    sample_order: UpdateOrder,
    pending_commands: usize,
}

impl RefreshOrchestrator {
    pub fn new(
        sampler: Sampler,
        tailer: Box<dyn LogTailer>,
        config: &DashboardConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RefreshEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            sampler,
            events,
            period: config.refresh_interval(),
            store: TimeSeriesStore::with_window(config.history_window),
            selection: SelectionController::new(),
            logs: LogStreamSupervisor::with_capacity(tailer, config.log_buffer_lines),
            entity_order: UpdateOrder::default(),
            sample_order: UpdateOrder::default(),
            pending_commands: 0,
        };
        (orchestrator, rx)
    }

    /// One refresh: entity listing and usage snapshot, neither waiting on the other
    pub fn tick(&mut self) {
        self.refresh_entities();
        self.refresh_samples();
    }

    pub fn refresh_entities(&mut self) {
        let seq = self.entity_order.issue();
        let sampler = self.sampler.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let entities = sampler.fetch_entities().await;
            let _ = tx.send(RefreshEvent::Entities { seq, entities });
        });
    }

    fn refresh_samples(&mut self) {
        let seq = self.sample_order.issue();
        let sampler = self.sampler.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let samples = sampler.fetch_samples().await;
            let _ = tx.send(RefreshEvent::Samples {
                seq,
                label: tick_label(),
                samples,
            });
        });
    }

    pub fn apply(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Entities { seq, entities } => {
                if self.entity_order.accept(seq) {
                    self.selection.on_refresh(entities);
                } else {
                    debug!(seq, "stale entity listing dropped");
                }
            }
            RefreshEvent::Samples {
                seq,
                label,
                samples,
            } => {
                if self.sample_order.accept(seq) {
                    self.store.ingest(label, &samples);
                } else {
                    debug!(seq, "stale usage snapshot dropped");
                }
            }
            RefreshEvent::LifecycleCompleted { action, id, result } => {
                self.pending_commands = self.pending_commands.saturating_sub(1);
                match &result {
                    Ok(()) => info!(%action, entity = %id, "lifecycle command completed"),
                    Err(e) => warn!(%action, entity = %id, error = %e, "lifecycle command failed"),
                }
                self.logs.on_lifecycle_completed(action, &id, &result);
                self.refresh_entities();
            }
        }
    }

    pub fn handle_input(&mut self, input: OperatorInput) -> LoopControl {
        match input {
            OperatorInput::Move(direction) => self.selection.on_move(direction),
            OperatorInput::Confirm => {
                if let Some(id) = self.selection.selected_entity_id().cloned() {
                    self.logs.start(&id);
                }
            }
            OperatorInput::Cancel => self.logs.cancel(),
            OperatorInput::Lifecycle(action) => {
                self.dispatch(action);
            }
            OperatorInput::Quit => {
                self.logs.shutdown();
                return LoopControl::Quit;
            }
        }
        LoopControl::Continue
    }

    /// Run `action` against the selected entity right away. Returns `false`
    /// when nothing is selected.
    pub fn dispatch(&mut self, action: LifecycleAction) -> bool {
        let Some(id) = self.selection.selected_entity_id().cloned() else {
            debug!(%action, "no entity selected");
            return false;
        };
        info!(%action, entity = %id, "dispatching lifecycle command");

        self.pending_commands += 1;
        let runtime = self.sampler.runtime().clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = runtime
                .run_lifecycle(action, &id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(RefreshEvent::LifecycleCompleted { action, id, result });
        });
        true
    }

    pub fn on_tail_event(&mut self, event: TailEvent) -> bool {
        self.logs.deliver(event)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn logs(&self) -> &LogStreamSupervisor {
        &self.logs
    }

    /// Lifecycle commands dispatched but not completed yet
    pub fn pending_commands(&self) -> usize {
        self.pending_commands
    }
}
