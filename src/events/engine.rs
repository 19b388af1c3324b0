use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор действия, выданный композитором при захвате сочетания
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Композитор возвращает 0, если сочетание захватить не удалось
    pub const NONE: ActionId = ActionId(0);

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Событие, доставленное движку горячих клавиш из внешнего источника
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineEvent {
    /// Поколение движка, в котором была оформлена подписка
    pub generation: u64,
    pub kind: EngineEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEventKind {
    AcceleratorActivated { action: ActionId, timestamp: u32 },
    InstalledChanged,
    AppConfigsChanged,
}

impl EngineEvent {
    pub fn new(generation: u64, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EngineEventKind::AcceleratorActivated { action, timestamp } => write!(
                f,
                "gen {}: accelerator {} activated at {}",
                self.generation, action, timestamp
            ),
            EngineEventKind::InstalledChanged => {
                write!(f, "gen {}: installed apps changed", self.generation)
            }
            EngineEventKind::AppConfigsChanged => {
                write!(f, "gen {}: app configs changed", self.generation)
            }
        }
    }
}
