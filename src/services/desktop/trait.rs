use crate::config::Config;
use crate::error::Result;
use crate::events::{ActionId, MonitorIndex, TrackedApp, WindowId, WindowInfo, WorkspaceIndex};
use crate::services::subscription::Subscription;
use bitflags::bitflags;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

bitflags! {
    /// Флаги захвата сочетания у композитора
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyBindingFlags: u32 {
        const NONE = 0;
        const PER_WINDOW = 1 << 0;
        const BUILTIN = 1 << 1;
        const IS_REVERSED = 1 << 2;
        const NON_MASKABLE = 1 << 3;
        const IGNORE_AUTOREPEAT = 1 << 4;
    }
}

bitflags! {
    /// Режимы ввода, в которых привязке разрешено срабатывать
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionMode: u32 {
        const NORMAL = 1 << 0;
        const OVERVIEW = 1 << 1;
        const LOCK_SCREEN = 1 << 2;
        const UNLOCK_SCREEN = 1 << 3;
        const LOGIN_SCREEN = 1 << 4;
        const SYSTEM_MODAL = 1 << 5;
        const LOOKING_GLASS = 1 << 6;
        const POPUP = 1 << 7;
    }
}

/// Обработчик срабатывания сочетания: действие и метка времени события
pub type AcceleratorCallback = Arc<dyn Fn(ActionId, u32) + Send + Sync>;

/// Обработчик изменения набора установленных приложений
pub type InstalledCallback = Arc<dyn Fn() + Send + Sync>;

/// Композитор: единое глобальное пространство привязок и операции над окнами
#[async_trait::async_trait]
pub trait Compositor: Send + Sync {
    /// `Ok(None)` означает "нет действия": строку не удалось разобрать
    /// или сочетание уже занято системной привязкой
    async fn grab_accelerator(&self, accelerator: &str, flags: KeyBindingFlags) -> Result<Option<ActionId>>;

    async fn ungrab_accelerator(&self, action: ActionId) -> Result<bool>;

    fn external_binding_name_for(&self, action: ActionId) -> String {
        format!("external-grab-{}", action.value())
    }

    fn connect_accelerator_activated(&self, callback: AcceleratorCallback) -> Subscription;

    /// Все окна в порядке наложения
    async fn windows(&self) -> Result<Vec<WindowInfo>>;

    async fn current_monitor(&self) -> Result<MonitorIndex>;

    async fn active_workspace(&self) -> Result<WorkspaceIndex>;

    fn current_time(&self) -> u32;

    async fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()>;

    async fn minimize(&self, window: WindowId) -> Result<()>;

    async fn change_workspace(&self, window: WindowId, workspace: WorkspaceIndex) -> Result<()>;

    async fn activate(&self, window: WindowId, timestamp: u32) -> Result<()>;

    async fn focus(&self, window: WindowId, timestamp: u32) -> Result<()>;
}

/// Слой разрешений оконного менеджера, который композитор спрашивает перед срабатыванием
pub trait KeybindingGate: Send + Sync {
    fn allow(&self, binding_name: &str, mode: ActionMode);

    fn revoke(&self, binding_name: &str);
}

/// Сопоставление окна и приложения-владельца
pub trait WindowTracker: Send + Sync {
    fn window_app(&self, window: &WindowInfo) -> Option<TrackedApp>;

    /// Приложение, которому принадлежит окно в фокусе
    fn focus_app(&self, windows: &[WindowInfo]) -> Option<TrackedApp> {
        windows
            .iter()
            .find(|window| window.has_focus)
            .and_then(|window| self.window_app(window))
    }

    fn app_windows<'a>(&self, app: &TrackedApp, windows: &'a [WindowInfo]) -> Vec<&'a WindowInfo> {
        windows
            .iter()
            .filter(|window| self.window_app(window).as_ref() == Some(app))
            .collect()
    }
}

/// Запись каталога установленных приложений
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub should_show: bool,
    pub exec: Option<String>,
    pub startup_wm_class: Option<String>,
}

impl InventoryEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            icon: None,
            should_show: true,
            exec: None,
            startup_wm_class: None,
        }
    }
}

/// Каталог установленных приложений
pub trait AppInventory: Send + Sync {
    fn all(&self) -> Vec<InventoryEntry>;

    fn lookup(&self, app_id: &str) -> Option<InventoryEntry>;

    /// Запуск без аргументов и без контекста запуска
    fn launch(&self, entry: &InventoryEntry) -> Result<()>;

    fn connect_installed_changed(&self, callback: InstalledCallback) -> Subscription;
}

/// Разрешения привязок, которые хранятся на нашей стороне
///
/// На backend'е GNOME Shell D-Bus режим ввода передаётся при захвате,
/// поэтому здесь остаётся только учёт выданных разрешений.
#[derive(Default)]
pub struct LocalKeybindingGate {
    allowed: RwLock<HashMap<String, ActionMode>>,
}

impl LocalKeybindingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_allowed(&self, binding_name: &str) -> bool {
        self.allowed.read().contains_key(binding_name)
    }

    pub fn allowed_count(&self) -> usize {
        self.allowed.read().len()
    }
}

impl KeybindingGate for LocalKeybindingGate {
    fn allow(&self, binding_name: &str, mode: ActionMode) {
        debug!("Разрешаем привязку {} в режиме {:?}", binding_name, mode);
        self.allowed.write().insert(binding_name.to_string(), mode);
    }

    fn revoke(&self, binding_name: &str) {
        debug!("Отзываем привязку {}", binding_name);
        self.allowed.write().remove(binding_name);
    }
}

/// Набор внешних сервисов рабочего стола, с которыми работает движок
#[derive(Clone)]
pub struct Desktop {
    pub compositor: Arc<dyn Compositor>,
    pub keybindings: Arc<dyn KeybindingGate>,
    pub tracker: Arc<dyn WindowTracker>,
    pub inventory: Arc<dyn AppInventory>,
}

/// Фабрика backend'а рабочего стола по конфигурации
pub async fn create_desktop(config: &Config) -> Result<Desktop> {
    let inventory = Arc::new(super::DesktopEntryInventory::new(
        config.desktop.application_dirs.clone(),
        config.inventory_poll_interval(),
    ));

    if config.is_dry_run() {
        info!("Dry-run режим - композитор работает в режиме эмуляции");
        return Ok(Desktop {
            compositor: Arc::new(super::DryRunCompositor::new()),
            keybindings: Arc::new(LocalKeybindingGate::new()),
            tracker: Arc::new(super::DesktopEntryTracker::new(inventory.clone())),
            inventory: Arc::new(super::DryRunInventory::new(inventory)),
        });
    }

    let compositor = super::GnomeShellCompositor::connect(super::X11Tools::new()).await?;

    Ok(Desktop {
        compositor: Arc::new(compositor),
        keybindings: Arc::new(LocalKeybindingGate::new()),
        tracker: Arc::new(super::DesktopEntryTracker::new(inventory.clone())),
        inventory,
    })
}
