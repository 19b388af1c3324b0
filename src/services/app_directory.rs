use crate::events::AppConfig;
use crate::services::desktop::{AppInventory, InventoryEntry};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Иконка для приложений, которых нет в каталоге
pub const FALLBACK_ICON: &str = "application-x-executable";

/// Доступ к каталогу установленных приложений
#[derive(Clone)]
pub struct AppDirectory {
    inventory: Arc<dyn AppInventory>,
}

impl AppDirectory {
    pub fn new(inventory: Arc<dyn AppInventory>) -> Self {
        Self { inventory }
    }

    /// Полная запись для `app_id`; отсутствие в каталоге не ошибка
    pub fn resolve(&self, app_id: &str, hotkey: &str) -> AppConfig {
        match self.inventory.lookup(app_id) {
            Some(entry) => AppConfig {
                id: entry.id,
                name: entry.name,
                description: entry.description.unwrap_or_default(),
                icon: entry.icon.unwrap_or_else(|| FALLBACK_ICON.to_string()),
                hotkey: hotkey.to_string(),
            },
            None => {
                debug!("Приложение {} не найдено в каталоге, используем заглушку", app_id);
                AppConfig {
                    id: app_id.to_string(),
                    name: app_id.to_string(),
                    description: String::new(),
                    icon: FALLBACK_ICON.to_string(),
                    hotkey: hotkey.to_string(),
                }
            }
        }
    }

    /// Видимые пользователю приложения, которых ещё нет в списке
    pub fn list_installed_not_configured(&self, excluded: &HashSet<String>) -> Vec<InventoryEntry> {
        let mut entries: Vec<InventoryEntry> = self
            .inventory
            .all()
            .into_iter()
            .filter(|entry| entry.should_show && !excluded.contains(&entry.id))
            .collect();

        entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        entries
    }

    /// Запуск без аргументов; `false`, если приложение не найдено или не запустилось
    pub fn launch(&self, app_id: &str) -> bool {
        let Some(entry) = self.inventory.lookup(app_id) else {
            debug!("Нечего запускать: {} нет в каталоге", app_id);
            return false;
        };

        match self.inventory.launch(&entry) {
            Ok(()) => true,
            Err(e) => {
                warn!("Не удалось запустить {}: {}", app_id, e);
                false
            }
        }
    }
}
