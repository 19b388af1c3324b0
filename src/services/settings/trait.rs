use crate::error::Result;
use crate::services::subscription::Subscription;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Обработчик изменения ключа; получает имя изменившегося ключа
pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Значение настройки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    StringList(Vec<String>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            SettingValue::StringList(_) => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::StringList(value) => Some(value),
            SettingValue::Bool(_) => None,
        }
    }
}

/// Внешний сервис настроек: ключ-значение с уведомлениями об изменениях
///
/// Чтение никогда не завершается ошибкой: при отсутствии или повреждении
/// значения возвращается значение по умолчанию.
pub trait SettingsService: Send + Sync {
    fn get_bool(&self, key: &str) -> bool;

    fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    fn get_string_list(&self, key: &str) -> Vec<String>;

    /// Заменяет список целиком
    fn set_string_list(&self, key: &str, value: &[String]) -> Result<()>;

    fn connect_changed(&self, key: &str, callback: ChangeCallback) -> SubscriptionId;

    fn disconnect(&self, id: SubscriptionId);
}

/// Подписаться на изменения ключа и получить отменяемую подписку
pub fn subscribe(
    settings: &Arc<dyn SettingsService>,
    key: &str,
    callback: ChangeCallback,
) -> Subscription {
    let id = settings.connect_changed(key, callback);
    let settings = Arc::clone(settings);
    Subscription::new("settings", move || settings.disconnect(id))
}
