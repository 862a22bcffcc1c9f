use std::fmt;

pub type EntityId = String;

/// Id shown in place of a real container when the runtime could not be queried.
pub const UNAVAILABLE_ID: &str = "Error";
pub const NOT_AVAILABLE: &str = "N/A";

/// One managed workload as reported by the runtime listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub image: String,
    pub status: String,
    pub ports: String,
    placeholder: bool,
}

impl Entity {
    pub fn new(
        id: impl Into<EntityId>,
        image: impl Into<String>,
        status: impl Into<String>,
        ports: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            status: status.into(),
            ports: ports.into(),
            placeholder: false,
        }
    }

    /// Sentinel row returned when the listing failed.
    pub fn unavailable() -> Self {
        Self {
            id: UNAVAILABLE_ID.into(),
            image: NOT_AVAILABLE.into(),
            status: NOT_AVAILABLE.into(),
            ports: NOT_AVAILABLE.into(),
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// One CPU/memory reading for one entity at one tick
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub entity_id: EntityId,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

impl Sample {
    pub fn new(entity_id: impl Into<EntityId>, cpu_percent: f64, memory_mb: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            cpu_percent,
            memory_mb,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Cpu,
    Memory,
}

impl Metric {
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU Usage (%)",
            Metric::Memory => "Memory Usage (MB)",
        }
    }
}

/// Lifecycle commands the operator can issue against the selected entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
    Delete,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 4] = [
        LifecycleAction::Start,
        LifecycleAction::Stop,
        LifecycleAction::Restart,
        LifecycleAction::Delete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
            LifecycleAction::Delete => "delete",
        }
    }

    /// Key bound to the action in the dashboard
    pub fn key(&self) -> char {
        match self {
            LifecycleAction::Start => 't',
            LifecycleAction::Stop => 's',
            LifecycleAction::Restart => 'r',
            LifecycleAction::Delete => 'd',
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == c)
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Input coming from the UI layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorInput {
    Move(Direction),
    /// Start tailing the selected entity.
    Confirm,
    /// Stop the active tail.
    Cancel,
    Lifecycle(LifecycleAction),
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_placeholder() {
        let e = Entity::unavailable();
        assert!(e.is_placeholder());
        assert_eq!(e.id, "Error");
        assert_eq!(e.ports, "N/A");
        assert!(!Entity::new("abc", "nginx", "Up", "").is_placeholder());
    }

    #[test]
    fn test_action_keys_roundtrip() {
        for action in LifecycleAction::ALL {
            assert_eq!(LifecycleAction::from_key(action.key()), Some(action));
        }
        assert_eq!(LifecycleAction::from_key('z'), None);
    }
}
