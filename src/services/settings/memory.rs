use super::registry::CallbackRegistry;
use super::r#trait::{ChangeCallback, SettingValue, SettingsService, SubscriptionId};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Хранилище настроек в памяти процесса
pub struct MemorySettings {
    values: RwLock<HashMap<String, SettingValue>>,
    defaults: HashMap<String, SettingValue>,
    registry: CallbackRegistry,
}

impl MemorySettings {
    pub fn new(defaults: Vec<(&'static str, SettingValue)>) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            defaults: defaults
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            registry: CallbackRegistry::default(),
        }
    }

    /// Количество активных подписок
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values
            .read()
            .get(key)
            .cloned()
            .or_else(|| self.defaults.get(key).cloned())
    }

    fn set(&self, key: &str, value: SettingValue) {
        let changed = {
            let mut values = self.values.write();
            let current = values.get(key).or_else(|| self.defaults.get(key));
            let changed = current != Some(&value);
            values.insert(key.to_string(), value);
            changed
        };

        if changed {
            self.registry.notify(key);
        }
    }
}

impl SettingsService for MemorySettings {
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|value| value.as_bool()).unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, SettingValue::Bool(value));
        Ok(())
    }

    fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(|value| value.as_string_list().map(<[String]>::to_vec))
            .unwrap_or_default()
    }

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<()> {
        self.set(key, SettingValue::StringList(value.to_vec()));
        Ok(())
    }

    fn connect_changed(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        self.registry.connect(key, callback)
    }

    fn disconnect(&self, id: SubscriptionId) {
        self.registry.disconnect(id);
    }
}
