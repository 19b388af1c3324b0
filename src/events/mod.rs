pub mod engine;
pub mod keyboard;
pub mod window;

pub use engine::{ActionId, EngineEvent, EngineEventKind};
pub use keyboard::{CapturedKey, KeyValue, ModifierMask};
pub use window::{MonitorIndex, TrackedApp, WindowGeometry, WindowId, WindowInfo, WorkspaceIndex};

use serde::{Deserialize, Serialize};

/// Одно приложение, настроенное пользователем
///
/// Сохраняются только `id` и `hotkey`; имя, описание и иконка каждый раз
/// заново берутся из каталога приложений.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Пустая строка означает "сочетание не задано"
    pub hotkey: String,
}

impl AppConfig {
    pub fn has_hotkey(&self) -> bool {
        !self.hotkey.is_empty()
    }
}

/// Сохраняемая форма `AppConfig`: `(id, hotkey)`
pub type AppConfigTuple = (String, String);
