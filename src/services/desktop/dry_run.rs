use super::r#trait::{AcceleratorCallback, AppInventory, Compositor, InstalledCallback, InventoryEntry, KeyBindingFlags};
use super::DesktopEntryInventory;
use crate::error::Result;
use crate::events::{ActionId, MonitorIndex, WindowId, WindowInfo, WorkspaceIndex};
use crate::services::subscription::Subscription;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

/// Композитор-эмулятор: выдаёт номера действий и логирует операции
pub struct DryRunCompositor {
    next_action: AtomicU32,
    grabs: Arc<RwLock<BTreeMap<ActionId, String>>>,
}

impl Default for DryRunCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunCompositor {
    pub fn new() -> Self {
        Self {
            next_action: AtomicU32::new(1),
            grabs: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl Compositor for DryRunCompositor {
    async fn grab_accelerator(&self, accelerator: &str, _flags: KeyBindingFlags) -> Result<Option<ActionId>> {
        let action = ActionId(self.next_action.fetch_add(1, Ordering::Relaxed));
        info!("[DRY RUN] Захват {} -> {}", accelerator, action);
        self.grabs.write().insert(action, accelerator.to_string());
        Ok(Some(action))
    }

    async fn ungrab_accelerator(&self, action: ActionId) -> Result<bool> {
        let removed = self.grabs.write().remove(&action);
        info!("[DRY RUN] Освобождение {} ({:?})", action, removed);
        Ok(removed.is_some())
    }

    fn connect_accelerator_activated(&self, callback: AcceleratorCallback) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("[DRY RUN] Нет tokio runtime, срабатывания эмулироваться не будут");
            return Subscription::inert("accelerator-activated");
        };

        let grabs = Arc::clone(&self.grabs);

        // Эмулируем нажатия по очереди для всех захваченных сочетаний
        let handle = runtime.spawn(async move {
            let mut ticker = interval(Duration::from_secs(10));
            let mut index = 0usize;
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let next = {
                    let grabs = grabs.read();
                    if grabs.is_empty() {
                        None
                    } else {
                        index = (index + 1) % grabs.len();
                        grabs.iter().nth(index).map(|(action, accelerator)| (*action, accelerator.clone()))
                    }
                };

                if let Some((action, accelerator)) = next {
                    info!("[DRY RUN] Эмулируем нажатие {} ({})", accelerator, action);
                    callback(action, 0);
                }
            }
        });

        Subscription::new("accelerator-activated", move || handle.abort())
    }

    async fn windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(Vec::new())
    }

    async fn current_monitor(&self) -> Result<MonitorIndex> {
        Ok(0)
    }

    async fn active_workspace(&self) -> Result<WorkspaceIndex> {
        Ok(0)
    }

    fn current_time(&self) -> u32 {
        0
    }

    async fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        info!("[DRY RUN] Перенос окна {} на монитор {}", window, monitor);
        Ok(())
    }

    async fn minimize(&self, window: WindowId) -> Result<()> {
        info!("[DRY RUN] Сворачивание окна {}", window);
        Ok(())
    }

    async fn change_workspace(&self, window: WindowId, workspace: WorkspaceIndex) -> Result<()> {
        info!("[DRY RUN] Перенос окна {} на рабочий стол {}", window, workspace);
        Ok(())
    }

    async fn activate(&self, window: WindowId, timestamp: u32) -> Result<()> {
        info!("[DRY RUN] Активация окна {} ({})", window, timestamp);
        Ok(())
    }

    async fn focus(&self, window: WindowId, timestamp: u32) -> Result<()> {
        info!("[DRY RUN] Фокус на окно {} ({})", window, timestamp);
        Ok(())
    }
}

/// Настоящий каталог приложений, но без реального запуска
pub struct DryRunInventory {
    inner: Arc<DesktopEntryInventory>,
}

impl DryRunInventory {
    pub fn new(inner: Arc<DesktopEntryInventory>) -> Self {
        Self { inner }
    }
}

impl AppInventory for DryRunInventory {
    fn all(&self) -> Vec<InventoryEntry> {
        self.inner.all()
    }

    fn lookup(&self, app_id: &str) -> Option<InventoryEntry> {
        self.inner.lookup(app_id)
    }

    fn launch(&self, entry: &InventoryEntry) -> Result<()> {
        info!("[DRY RUN] Запуск {} ({:?})", entry.id, entry.exec);
        Ok(())
    }

    fn connect_installed_changed(&self, callback: InstalledCallback) -> Subscription {
        self.inner.connect_installed_changed(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_grabs_are_sequential_and_released() {
        let compositor = DryRunCompositor::new();

        let first = compositor.grab_accelerator("<Super>t", KeyBindingFlags::NONE).await.unwrap();
        let second = compositor.grab_accelerator("<Super>b", KeyBindingFlags::NONE).await.unwrap();

        assert_eq!(first, Some(ActionId(1)));
        assert_eq!(second, Some(ActionId(2)));
        assert_eq!(compositor.external_binding_name_for(ActionId(2)), "external-grab-2");

        assert!(compositor.ungrab_accelerator(ActionId(1)).await.unwrap());
        assert!(!compositor.ungrab_accelerator(ActionId(1)).await.unwrap());
    }
}
