use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub settings: SettingsConfig,
    pub desktop: DesktopConfig,
    pub animations: AnimationsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    /// JSON-файл с настройками расширения (список приложений, флаг анимаций)
    pub path: PathBuf,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DesktopConfig {
    pub backend: String,
    /// Пустой список означает стандартные каталоги XDG
    #[serde(default)]
    pub application_dirs: Vec<PathBuf>,
    pub inventory_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimationsConfig {
    pub restore_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            settings: SettingsConfig {
                path: default_settings_path(),
                poll_interval_ms: 500,
            },
            desktop: DesktopConfig {
                backend: "gnome".to_string(),
                application_dirs: Vec::new(),
                inventory_poll_interval_ms: 2000,
            },
            animations: AnimationsConfig {
                restore_delay_ms: 100,
            },
        }
    }
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("app-hotkeys")
        .join("settings.json")
}

impl Config {
    /// Файл конфигурации не обязателен: отсутствующие поля берутся из значений по умолчанию
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("APP_HOTKEYS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        match self.desktop.backend.as_str() {
            "gnome" | "dry-run" => {}
            _ => anyhow::bail!("Неизвестный backend рабочего стола: {}", self.desktop.backend),
        }

        if self.settings.poll_interval_ms < 100 {
            anyhow::bail!("settings.poll_interval_ms должно быть минимум 100");
        }

        if self.desktop.inventory_poll_interval_ms < 100 {
            anyhow::bail!("desktop.inventory_poll_interval_ms должно быть минимум 100");
        }

        if self.animations.restore_delay_ms == 0 {
            anyhow::bail!("animations.restore_delay_ms должно быть больше 0");
        }

        Ok(())
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.animations.restore_delay_ms)
    }

    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms)
    }

    pub fn inventory_poll_interval(&self) -> Duration {
        Duration::from_millis(self.desktop.inventory_poll_interval_ms)
    }

    pub fn is_dry_run(&self) -> bool {
        self.desktop.backend == "dry-run"
    }
}
