//! Хранилища настроек с уведомлениями об изменениях
//!
//! Два логических хранилища: собственные настройки (список приложений,
//! флаг пропуска анимаций) и настройки интерфейса рабочего стола
//! (флаг включённых анимаций).

mod gsettings;
mod json_file;
mod memory;
mod registry;
mod r#trait;

pub use self::gsettings::GSettingsCli;
pub use self::json_file::JsonFileSettings;
pub use self::memory::MemorySettings;
pub use self::r#trait::{subscribe, ChangeCallback, SettingValue, SettingsService, SubscriptionId};

/// Ключ списка настроенных приложений
pub const KEY_APP_CONFIGS: &str = "configs";
/// Ключ флага "пропускать анимации окон"
pub const KEY_DISABLE_ANIMATIONS: &str = "disable-animations";
/// Ключ флага анимаций в настройках интерфейса
pub const KEY_ENABLE_ANIMATIONS: &str = "enable-animations";
/// Схема настроек интерфейса рабочего стола
pub const INTERFACE_SCHEMA_ID: &str = "org.gnome.desktop.interface";

/// Значения по умолчанию для собственных настроек
pub fn extension_defaults() -> Vec<(&'static str, SettingValue)> {
    vec![
        (KEY_APP_CONFIGS, SettingValue::StringList(Vec::new())),
        (KEY_DISABLE_ANIMATIONS, SettingValue::Bool(false)),
    ]
}

/// Значения по умолчанию для настроек интерфейса
pub fn interface_defaults() -> Vec<(&'static str, SettingValue)> {
    vec![(KEY_ENABLE_ANIMATIONS, SettingValue::Bool(true))]
}
