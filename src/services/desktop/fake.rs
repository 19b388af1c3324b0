//! Записывающий рабочий стол для тестов движка

use super::r#trait::{
    AcceleratorCallback, ActionMode, AppInventory, Compositor, Desktop, InstalledCallback, InventoryEntry,
    KeyBindingFlags, KeybindingGate, WindowTracker,
};
use crate::error::Result;
use crate::events::{ActionId, MonitorIndex, TrackedApp, WindowId, WindowInfo, WorkspaceIndex};
use crate::hotkey_error;
use crate::services::subscription::Subscription;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Grab(String),
    Ungrab(ActionId),
    Allow(String, ActionMode),
    Revoke(String),
    MoveToMonitor(WindowId, MonitorIndex),
    Minimize(WindowId),
    ChangeWorkspace(WindowId, WorkspaceIndex),
    Activate(WindowId, u32),
    Focus(WindowId, u32),
    Launch(String),
}

type CallbackList<T> = Arc<Mutex<Vec<(u64, T)>>>;

#[derive(Default)]
pub struct FakeDesktop {
    calls: Mutex<Vec<Call>>,
    next_action: AtomicU32,
    grabs: Mutex<BTreeMap<ActionId, String>>,
    allowed: Mutex<HashSet<String>>,
    taken: Mutex<HashSet<String>>,
    windows: Mutex<Vec<WindowInfo>>,
    owners: Mutex<HashMap<WindowId, TrackedApp>>,
    current_monitor: AtomicI32,
    active_workspace: AtomicI32,
    time: AtomicU32,
    entries: Mutex<Vec<InventoryEntry>>,
    launch_fails: AtomicBool,
    next_subscription: AtomicU64,
    accelerator_callbacks: CallbackList<AcceleratorCallback>,
    installed_callbacks: CallbackList<InstalledCallback>,
    subscriptions_opened: AtomicUsize,
    subscriptions_cancelled: Arc<AtomicUsize>,
}

impl FakeDesktop {
    pub fn new() -> Arc<Self> {
        let desktop = Self::default();
        desktop.next_action.store(1, Ordering::SeqCst);
        Arc::new(desktop)
    }

    pub fn desktop(self: &Arc<Self>) -> Desktop {
        Desktop {
            compositor: self.clone(),
            keybindings: self.clone(),
            tracker: self.clone(),
            inventory: self.clone(),
        }
    }

    /// Сочетание, на которое композитор отвечает "нет действия"
    pub fn take_accelerator(&self, accelerator: &str) {
        self.taken.lock().insert(accelerator.to_string());
    }

    pub fn install(&self, entry: InventoryEntry) {
        self.entries.lock().push(entry);
    }

    pub fn uninstall(&self, app_id: &str) {
        self.entries.lock().retain(|entry| entry.id != app_id);
    }

    pub fn add_window(&self, window: WindowInfo, owner: &str) {
        self.owners
            .lock()
            .insert(window.id, TrackedApp::new(None, owner));
        self.windows.lock().push(window);
    }

    pub fn set_current_monitor(&self, monitor: MonitorIndex) {
        self.current_monitor.store(monitor, Ordering::SeqCst);
    }

    pub fn set_active_workspace(&self, workspace: WorkspaceIndex) {
        self.active_workspace.store(workspace, Ordering::SeqCst);
    }

    pub fn set_time(&self, time: u32) {
        self.time.store(time, Ordering::SeqCst);
    }

    pub fn fail_launches(&self) {
        self.launch_fails.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Вызовы, изменяющие окна или запускающие приложения
    pub fn window_calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|call| !matches!(call, Call::Grab(_) | Call::Ungrab(_) | Call::Allow(..) | Call::Revoke(_)))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn grab_count(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, Call::Grab(_))).count()
    }

    /// Сочетания, захваченные и ещё не освобождённые
    pub fn outstanding_grabs(&self) -> Vec<String> {
        self.grabs.lock().values().cloned().collect()
    }

    pub fn outstanding_actions(&self) -> Vec<ActionId> {
        self.grabs.lock().keys().copied().collect()
    }

    pub fn allowed_names(&self) -> HashSet<String> {
        self.allowed.lock().clone()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions_opened.load(Ordering::SeqCst) - self.subscriptions_cancelled.load(Ordering::SeqCst)
    }

    pub fn subscriptions_cancelled(&self) -> usize {
        self.subscriptions_cancelled.load(Ordering::SeqCst)
    }

    /// Нажать сочетание, как это сделал бы композитор
    pub fn fire(&self, action: ActionId, timestamp: u32) {
        let callbacks: Vec<AcceleratorCallback> = self
            .accelerator_callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(action, timestamp);
        }
    }

    pub fn fire_installed_changed(&self) {
        let callbacks: Vec<InstalledCallback> = self
            .installed_callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn register<T: Send + 'static>(&self, list: &CallbackList<T>, callback: T, label: &'static str) -> Subscription {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        list.lock().push((id, callback));
        self.subscriptions_opened.fetch_add(1, Ordering::SeqCst);

        let list = Arc::clone(list);
        let cancelled = Arc::clone(&self.subscriptions_cancelled);
        Subscription::new(label, move || {
            list.lock().retain(|(entry, _)| *entry != id);
            cancelled.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[async_trait::async_trait]
impl Compositor for FakeDesktop {
    async fn grab_accelerator(&self, accelerator: &str, _flags: KeyBindingFlags) -> Result<Option<ActionId>> {
        self.record(Call::Grab(accelerator.to_string()));
        if self.taken.lock().contains(accelerator) {
            return Ok(None);
        }

        let action = ActionId(self.next_action.fetch_add(1, Ordering::SeqCst));
        self.grabs.lock().insert(action, accelerator.to_string());
        Ok(Some(action))
    }

    async fn ungrab_accelerator(&self, action: ActionId) -> Result<bool> {
        self.record(Call::Ungrab(action));
        Ok(self.grabs.lock().remove(&action).is_some())
    }

    fn connect_accelerator_activated(&self, callback: AcceleratorCallback) -> Subscription {
        self.register(&self.accelerator_callbacks, callback, "accelerator-activated")
    }

    async fn windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(self.windows.lock().clone())
    }

    async fn current_monitor(&self) -> Result<MonitorIndex> {
        Ok(self.current_monitor.load(Ordering::SeqCst))
    }

    async fn active_workspace(&self) -> Result<WorkspaceIndex> {
        Ok(self.active_workspace.load(Ordering::SeqCst))
    }

    fn current_time(&self) -> u32 {
        self.time.load(Ordering::SeqCst)
    }

    async fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        self.record(Call::MoveToMonitor(window, monitor));
        Ok(())
    }

    async fn minimize(&self, window: WindowId) -> Result<()> {
        self.record(Call::Minimize(window));
        Ok(())
    }

    async fn change_workspace(&self, window: WindowId, workspace: WorkspaceIndex) -> Result<()> {
        self.record(Call::ChangeWorkspace(window, workspace));
        Ok(())
    }

    async fn activate(&self, window: WindowId, timestamp: u32) -> Result<()> {
        self.record(Call::Activate(window, timestamp));
        Ok(())
    }

    async fn focus(&self, window: WindowId, timestamp: u32) -> Result<()> {
        self.record(Call::Focus(window, timestamp));
        Ok(())
    }
}

impl KeybindingGate for FakeDesktop {
    fn allow(&self, binding_name: &str, mode: ActionMode) {
        self.record(Call::Allow(binding_name.to_string(), mode));
        self.allowed.lock().insert(binding_name.to_string());
    }

    fn revoke(&self, binding_name: &str) {
        self.record(Call::Revoke(binding_name.to_string()));
        self.allowed.lock().remove(binding_name);
    }
}

impl WindowTracker for FakeDesktop {
    fn window_app(&self, window: &WindowInfo) -> Option<TrackedApp> {
        self.owners.lock().get(&window.id).cloned()
    }
}

impl AppInventory for FakeDesktop {
    fn all(&self) -> Vec<InventoryEntry> {
        self.entries.lock().clone()
    }

    fn lookup(&self, app_id: &str) -> Option<InventoryEntry> {
        self.entries.lock().iter().find(|entry| entry.id == app_id).cloned()
    }

    fn launch(&self, entry: &InventoryEntry) -> Result<()> {
        self.record(Call::Launch(entry.id.clone()));
        if self.launch_fails.load(Ordering::SeqCst) {
            return Err(hotkey_error!(internal, "запуск {} не удался", entry.id));
        }
        Ok(())
    }

    fn connect_installed_changed(&self, callback: InstalledCallback) -> Subscription {
        self.register(&self.installed_callbacks, callback, "installed-changed")
    }
}
