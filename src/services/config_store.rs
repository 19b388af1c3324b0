use crate::error::Result;
use crate::events::{AppConfig, AppConfigTuple};
use crate::services::app_directory::AppDirectory;
use crate::services::settings::{ChangeCallback, SettingsService, SubscriptionId, KEY_APP_CONFIGS, KEY_DISABLE_ANIMATIONS};
use crate::services::subscription::Subscription;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Сохраняемая форма записи: компактный JSON-массив `["<id>","<hotkey>"]`
pub fn encode_record(config: &AppConfig) -> String {
    Value::Array(vec![
        Value::String(config.id.clone()),
        Value::String(config.hotkey.clone()),
    ])
    .to_string()
}

/// `None` для всего, что не является массивом ровно из двух строк с непустым id
pub fn decode_record(raw: &str) -> Option<AppConfigTuple> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return None;
    };

    match items.as_slice() {
        [Value::String(id), Value::String(hotkey)] if !id.is_empty() => Some((id.clone(), hotkey.clone())),
        _ => None,
    }
}

/// Список настроенных приложений поверх хранилища настроек
pub struct ConfigStore {
    settings: Arc<dyn SettingsService>,
    directory: AppDirectory,
    // Подписки, выданные через on_change и ещё не отменённые
    subscriptions: Arc<Mutex<HashSet<SubscriptionId>>>,
}

impl ConfigStore {
    pub fn new(settings: Arc<dyn SettingsService>, directory: AppDirectory) -> Self {
        Self {
            settings,
            directory,
            subscriptions: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn directory(&self) -> &AppDirectory {
        &self.directory
    }

    fn raw_records(&self) -> Vec<String> {
        self.settings.get_string_list(KEY_APP_CONFIGS)
    }

    fn decoded_records(&self) -> impl Iterator<Item = AppConfigTuple> {
        self.raw_records().into_iter().filter_map(|raw| {
            let decoded = decode_record(&raw);
            if decoded.is_none() {
                debug!("Пропускаем повреждённую запись: {}", raw);
            }
            decoded
        })
    }

    /// Все корректные записи, дополненные данными из каталога приложений
    pub fn load(&self) -> Vec<AppConfig> {
        self.decoded_records()
            .map(|(id, hotkey)| self.directory.resolve(&id, &hotkey))
            .collect()
    }

    /// Заменить список целиком
    pub fn save(&self, configs: &[AppConfig]) -> Result<()> {
        let records: Vec<String> = configs.iter().map(encode_record).collect();
        self.settings.set_string_list(KEY_APP_CONFIGS, &records)
    }

    pub fn add(&self, config: &AppConfig) -> Result<()> {
        let mut records = self.raw_records();
        records.push(encode_record(config));
        self.settings.set_string_list(KEY_APP_CONFIGS, &records)
    }

    fn position_of(records: &[String], app_id: &str) -> Option<usize> {
        records
            .iter()
            .position(|raw| decode_record(raw).is_some_and(|(id, _)| id == app_id))
    }

    /// Удаляет первую запись с этим id; без совпадения ничего не пишет
    pub fn remove_by_id(&self, app_id: &str) -> Result<bool> {
        let mut records = self.raw_records();
        let Some(index) = Self::position_of(&records, app_id) else {
            return Ok(false);
        };

        records.remove(index);
        self.settings.set_string_list(KEY_APP_CONFIGS, &records)?;
        Ok(true)
    }

    /// Меняет сочетание в первой записи с этим id, остальные записи не трогает
    pub fn update_hotkey_by_id(&self, app_id: &str, hotkey: &str) -> Result<bool> {
        let mut records = self.raw_records();
        let Some(index) = Self::position_of(&records, app_id) else {
            return Ok(false);
        };

        records[index] = encode_record(&AppConfig {
            id: app_id.to_string(),
            name: String::new(),
            description: String::new(),
            icon: String::new(),
            hotkey: hotkey.to_string(),
        });
        self.settings.set_string_list(KEY_APP_CONFIGS, &records)?;
        Ok(true)
    }

    /// Подписка на изменение списка приложений
    pub fn on_change(&self, callback: ChangeCallback) -> Subscription {
        let id = self.settings.connect_changed(KEY_APP_CONFIGS, callback);
        self.subscriptions.lock().insert(id);

        let settings = Arc::clone(&self.settings);
        let subscriptions = Arc::clone(&self.subscriptions);
        Subscription::new("configs", move || {
            if subscriptions.lock().remove(&id) {
                settings.disconnect(id);
            }
        })
    }

    pub fn configured_ids(&self) -> HashSet<String> {
        self.decoded_records().map(|(id, _)| id).collect()
    }

    pub fn should_skip_animations(&self) -> bool {
        self.settings.get_bool(KEY_DISABLE_ANIMATIONS)
    }

    pub fn set_skip_animations(&self, skip: bool) -> Result<()> {
        self.settings.set_bool(KEY_DISABLE_ANIMATIONS, skip)
    }

    /// Отключает все ещё активные подписки, выданные через [`ConfigStore::on_change`]
    pub fn dispose(&self) {
        let remaining: Vec<SubscriptionId> = self.subscriptions.lock().drain().collect();
        for id in remaining {
            self.settings.disconnect(id);
        }
    }
}
