use super::registry::CallbackRegistry;
use super::r#trait::{ChangeCallback, SettingValue, SettingsService, SubscriptionId};
use crate::error::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Хранилище настроек в JSON-файле
///
/// Запись заменяет файл атомарно. Изменения, сделанные другим процессом
/// (например, CLI), подхватываются через [`JsonFileSettings::reload`].
pub struct JsonFileSettings {
    path: PathBuf,
    values: RwLock<BTreeMap<String, SettingValue>>,
    defaults: HashMap<String, SettingValue>,
    registry: CallbackRegistry,
    // Сериализует запись файла между потоками
    write_lock: Mutex<()>,
}

impl JsonFileSettings {
    pub fn open(path: impl Into<PathBuf>, defaults: Vec<(&'static str, SettingValue)>) -> Result<Self> {
        let path = path.into();
        let values = Self::read_file(&path)?;

        info!("Настройки загружены из {:?} ({} ключей)", path, values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
            defaults: defaults
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            registry: CallbackRegistry::default(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<BTreeMap<String, SettingValue>> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(&self, values: &BTreeMap<String, SettingValue>) -> Result<()> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(values)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values
            .read()
            .get(key)
            .cloned()
            .or_else(|| self.defaults.get(key).cloned())
    }

    fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        let changed = {
            let mut values = self.values.write();
            let unchanged = values.get(key).or_else(|| self.defaults.get(key)) == Some(&value);
            if unchanged && values.contains_key(key) {
                false
            } else {
                values.insert(key.to_string(), value);
                self.write_file(&values)?;
                !unchanged
            }
        };

        if changed {
            self.registry.notify(key);
        }
        Ok(())
    }

    /// Перечитать файл и уведомить подписчиков об изменившихся ключах
    pub fn reload(&self) -> Result<Vec<String>> {
        let fresh = Self::read_file(&self.path)?;

        let changed_keys: Vec<String> = {
            let mut values = self.values.write();
            let mut changed: Vec<String> = fresh
                .iter()
                .filter(|(key, value)| values.get(*key) != Some(*value))
                .map(|(key, _)| key.clone())
                .collect();
            changed.extend(values.keys().filter(|key| !fresh.contains_key(*key)).cloned());
            *values = fresh;
            changed
        };

        for key in &changed_keys {
            debug!("Ключ настроек '{}' изменён извне", key);
            self.registry.notify(key);
        }

        Ok(changed_keys)
    }

    /// Периодически перечитывает файл, пока задача не будет прервана
    pub fn spawn_reload_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let settings = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                if let Err(e) = settings.reload() {
                    warn!("Не удалось перечитать настройки {:?}: {}", settings.path, e);
                }
            }
        })
    }
}

impl SettingsService for JsonFileSettings {
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|value| value.as_bool()).unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, SettingValue::Bool(value))
    }

    fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(|value| value.as_string_list().map(<[String]>::to_vec))
            .unwrap_or_default()
    }

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<()> {
        self.set(key, SettingValue::StringList(value.to_vec()))
    }

    fn connect_changed(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        self.registry.connect(key, callback)
    }

    fn disconnect(&self, id: SubscriptionId) {
        self.registry.disconnect(id);
    }
}
