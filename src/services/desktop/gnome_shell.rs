use super::r#trait::{AcceleratorCallback, Compositor, KeyBindingFlags};
use super::ActionMode;
use super::X11Tools;
use crate::error::Result;
use crate::events::{ActionId, MonitorIndex, WindowId, WindowInfo, WorkspaceIndex};
use crate::hotkey_error;
use crate::services::subscription::Subscription;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedValue;
use zbus::Connection;

#[zbus::proxy(
    interface = "org.gnome.Shell",
    default_service = "org.gnome.Shell",
    default_path = "/org/gnome/Shell"
)]
trait Shell {
    fn grab_accelerator(&self, accelerator: &str, mode_flags: u32, grab_flags: u32) -> zbus::Result<u32>;

    fn ungrab_accelerator(&self, action: u32) -> zbus::Result<bool>;

    #[zbus(signal)]
    fn accelerator_activated(&self, action: u32, parameters: HashMap<String, OwnedValue>) -> zbus::Result<()>;
}

/// Композитор GNOME Shell: привязки через D-Bus, операции с окнами через X11-утилиты
pub struct GnomeShellCompositor {
    proxy: ShellProxy<'static>,
    tools: X11Tools,
    last_timestamp: Arc<AtomicU32>,
}

impl GnomeShellCompositor {
    pub async fn connect(tools: X11Tools) -> Result<Self> {
        info!("Подключение к GNOME Shell через D-Bus");

        let connection = Connection::session()
            .await
            .map_err(|e| hotkey_error!(service_unavailable, "сессионная шина D-Bus: {}", e))?;
        let proxy = ShellProxy::new(&connection).await?;

        if let Err(e) = tools.test().await {
            warn!("X11-утилиты недоступны, операции с окнами будут завершаться ошибкой: {}", e);
        }

        Ok(Self {
            proxy,
            tools,
            last_timestamp: Arc::new(AtomicU32::new(0)),
        })
    }
}

#[async_trait::async_trait]
impl Compositor for GnomeShellCompositor {
    async fn grab_accelerator(&self, accelerator: &str, flags: KeyBindingFlags) -> Result<Option<ActionId>> {
        let action = self
            .proxy
            .grab_accelerator(accelerator, ActionMode::NORMAL.bits(), flags.bits())
            .await?;

        debug!("GrabAccelerator({}) -> {}", accelerator, action);
        Ok((action != ActionId::NONE.value()).then_some(ActionId(action)))
    }

    async fn ungrab_accelerator(&self, action: ActionId) -> Result<bool> {
        Ok(self.proxy.ungrab_accelerator(action.value()).await?)
    }

    fn connect_accelerator_activated(&self, callback: AcceleratorCallback) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Нет tokio runtime, сигналы AcceleratorActivated не будут приниматься");
            return Subscription::inert("accelerator-activated");
        };

        let proxy = self.proxy.clone();
        let last_timestamp = Arc::clone(&self.last_timestamp);

        let handle = runtime.spawn(async move {
            let mut stream = match proxy.receive_accelerator_activated().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Не удалось подписаться на AcceleratorActivated: {}", e);
                    return;
                }
            };

            while let Some(signal) = stream.next().await {
                let args = match signal.args() {
                    Ok(args) => args,
                    Err(e) => {
                        warn!("Некорректный сигнал AcceleratorActivated: {}", e);
                        continue;
                    }
                };

                let timestamp = args
                    .parameters()
                    .get("timestamp")
                    .and_then(|value| value.downcast_ref::<u32>().ok())
                    .unwrap_or(0);
                last_timestamp.store(timestamp, Ordering::Relaxed);

                callback(ActionId(*args.action()), timestamp);
            }

            debug!("Поток AcceleratorActivated завершён");
        });

        Subscription::new("accelerator-activated", move || handle.abort())
    }

    async fn windows(&self) -> Result<Vec<WindowInfo>> {
        self.tools.windows().await
    }

    async fn current_monitor(&self) -> Result<MonitorIndex> {
        self.tools.current_monitor().await
    }

    async fn active_workspace(&self) -> Result<WorkspaceIndex> {
        self.tools.active_workspace().await
    }

    fn current_time(&self) -> u32 {
        self.last_timestamp.load(Ordering::Relaxed)
    }

    async fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        self.tools.move_to_monitor(window, monitor).await
    }

    async fn minimize(&self, window: WindowId) -> Result<()> {
        self.tools.minimize(window).await
    }

    async fn change_workspace(&self, window: WindowId, workspace: WorkspaceIndex) -> Result<()> {
        if workspace < 0 {
            return Err(hotkey_error!(internal, "некорректный рабочий стол {}", workspace));
        }
        self.tools.change_workspace(window, workspace).await
    }

    async fn activate(&self, window: WindowId, _timestamp: u32) -> Result<()> {
        self.tools.activate(window).await
    }

    async fn focus(&self, window: WindowId, _timestamp: u32) -> Result<()> {
        self.tools.focus(window).await
    }
}
