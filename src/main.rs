use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use events::{AppConfig, CapturedKey};
use mappings::parse_accelerator;
use services::binding_validator::{capture_hotkey, Capture};
use services::desktop::DesktopEntryInventory;
use services::settings::{
    extension_defaults, interface_defaults, GSettingsCli, JsonFileSettings, MemorySettings, SettingsService,
    INTERFACE_SCHEMA_ID,
};
use services::{
    create_desktop, AnimationHook, AnimationSuppressor, AppDirectory, ConfigStore, HotkeyEngine, NoopAnimationHook,
    SettingsAnimationHook,
};

/// Код клавиши для сочетаний, введённых текстом: считаем их физическим нажатием
const TYPED_KEY_CODE: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "app-hotkeys")]
#[command(about = "Горячие клавиши для приложений: показать, свернуть или запустить")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "app-hotkeys.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Запустить демон
    Run,
    /// Настроенные приложения и их сочетания
    List,
    /// Установленные приложения, которые ещё не настроены
    Available,
    /// Добавить приложение без сочетания
    Add { app_id: String },
    /// Удалить приложение из списка
    Remove { app_id: String },
    /// Назначить сочетание, например `<Super>t`
    SetHotkey { app_id: String, accelerator: String },
    /// Убрать сочетание
    ClearHotkey { app_id: String },
    /// Пропускать анимации окон
    SkipAnimations {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Проверить, годится ли сочетание
    Check { accelerator: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if args.dry_run {
        config.desktop.backend = "dry-run".to_string();
    }

    // Инициализация системы логирования
    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, &config.logging.format)?;

    info!("Запуск app-hotkeys v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    match args.command {
        Command::Run => run(&config).await,
        command => run_command(&config, command),
    }
}

async fn run(config: &Config) -> Result<()> {
    if config.is_dry_run() {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    let desktop = create_desktop(config).await?;

    let settings = Arc::new(JsonFileSettings::open(&config.settings.path, extension_defaults())?);
    let reload_task = settings.spawn_reload_task(config.settings_poll_interval());

    let (interface, hook): (Arc<dyn SettingsService>, Arc<dyn AnimationHook>) = if config.is_dry_run() {
        (Arc::new(MemorySettings::new(interface_defaults())), Arc::new(NoopAnimationHook))
    } else {
        let interface: Arc<dyn SettingsService> =
            Arc::new(GSettingsCli::new(INTERFACE_SCHEMA_ID, interface_defaults()));
        (interface.clone(), Arc::new(SettingsAnimationHook::new(interface)))
    };

    let store = Arc::new(ConfigStore::new(settings, AppDirectory::new(desktop.inventory.clone())));
    let suppressor = Arc::new(AnimationSuppressor::new(interface, hook, config.restore_delay()));

    let (mut engine, events) = HotkeyEngine::new(desktop, store, suppressor);
    engine.init().await;

    info!("Все компоненты инициализированы");

    // Ожидание сигнала завершения
    let shutdown = shutdown_signal()?;
    engine.run(events, shutdown).await;

    reload_task.abort();
    info!("app-hotkeys завершил работу");
    Ok(())
}

/// Завершается по Ctrl+C или SIGTERM (остановка сервиса, выход из сессии).
/// Обработчик SIGTERM ставится сразу, до первого опроса.
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut terminate = unix_signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            },
            _ = terminate.recv() => info!("Получен сигнал завершения (SIGTERM)"),
        }
    })
}

fn run_command(config: &Config, command: Command) -> Result<()> {
    let inventory = Arc::new(DesktopEntryInventory::new(
        config.desktop.application_dirs.clone(),
        config.inventory_poll_interval(),
    ));
    let directory = AppDirectory::new(inventory);
    let settings = Arc::new(JsonFileSettings::open(&config.settings.path, extension_defaults())?);
    let store = ConfigStore::new(settings, directory.clone());

    match command {
        Command::Run => bail!("Демон запускается через run()"),
        Command::List => {
            for app in store.load() {
                let hotkey = if app.has_hotkey() { app.hotkey.as_str() } else { "-" };
                println!("{}\t{}\t{}", app.id, app.name, hotkey);
            }
        }
        Command::Available => {
            for entry in directory.list_installed_not_configured(&store.configured_ids()) {
                println!("{}\t{}", entry.id, entry.name);
            }
        }
        Command::Add { app_id } => {
            let available = directory.list_installed_not_configured(&store.configured_ids());
            if !available.iter().any(|entry| entry.id == app_id) {
                bail!("Приложение {} не установлено или уже добавлено", app_id);
            }

            let app: AppConfig = directory.resolve(&app_id, "");
            store.add(&app)?;
            println!("Добавлено: {} ({})", app.name, app.id);
        }
        Command::Remove { app_id } => {
            if store.remove_by_id(&app_id)? {
                println!("Удалено: {}", app_id);
            } else {
                println!("{} не найдено в списке", app_id);
            }
        }
        Command::SetHotkey { app_id, accelerator } => {
            let hotkey = match capture_typed(&accelerator)? {
                Capture::Cancel => {
                    println!("Сочетание не изменено");
                    return Ok(());
                }
                Capture::Clear => String::new(),
                Capture::Set(hotkey) => hotkey,
                Capture::Rejected => bail!("Сочетание {} нельзя использовать", accelerator),
            };
            update_hotkey(&store, &app_id, &hotkey)?;
        }
        Command::ClearHotkey { app_id } => update_hotkey(&store, &app_id, "")?,
        Command::SkipAnimations { state } => {
            store.set_skip_animations(matches!(state, Toggle::On))?;
            println!("Пропуск анимаций: {:?}", state);
        }
        Command::Check { accelerator } => match capture_typed(&accelerator)? {
            Capture::Set(hotkey) => println!("{}: подходит", hotkey),
            other => println!("{}: не подходит ({:?})", accelerator, other),
        },
    }

    Ok(())
}

/// Сочетание, введённое текстом, разбирается как нажатие в диалоге захвата
fn capture_typed(accelerator: &str) -> Result<Capture> {
    if accelerator.trim().is_empty() {
        return Ok(Capture::Clear);
    }

    let (key_value, modifiers) = parse_accelerator(accelerator)?;
    Ok(capture_hotkey(CapturedKey::new(TYPED_KEY_CODE, key_value, modifiers)))
}

fn update_hotkey(store: &ConfigStore, app_id: &str, hotkey: &str) -> Result<()> {
    if !store.update_hotkey_by_id(app_id, hotkey)? {
        bail!("{} не найдено в списке", app_id);
    }

    if hotkey.is_empty() {
        println!("{}: сочетание убрано", app_id);
    } else {
        println!("{}: {}", app_id, hotkey);
    }
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);

    // Логи идут в stderr, stdout остаётся для вывода команд
    match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sigterm_completes_shutdown() {
        let shutdown = shutdown_signal().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .expect("SIGTERM должен завершать ожидание");
    }

    #[test]
    fn typed_accelerators_follow_capture_rules() {
        assert!(matches!(capture_typed("").unwrap(), Capture::Clear));
        assert!(matches!(capture_typed("Escape").unwrap(), Capture::Cancel));
        assert!(matches!(capture_typed("<Super>t").unwrap(), Capture::Set(ref hotkey) if hotkey == "<Super>t"));
        assert!(matches!(capture_typed("t").unwrap(), Capture::Rejected));
    }
}
