use super::HotkeyEngine;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{ActionId, AppConfig, WindowInfo};
use crate::services::animation_suppressor::AnimationSuppressor;
use crate::services::config_store::ConfigStore;
use tracing::{debug, warn};

/// Чем закончилась обработка нажатия
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Сочетание не принадлежит текущему поколению
    Ignored,
    /// Окно в фокусе перенесено на текущий монитор или свёрнуто
    MovedOrHidden,
    /// Существующее окно показано и получило фокус
    Shown,
    /// Окон нет, выполнен запуск; `false`, если запустить не удалось
    Launched(bool),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, DispatchOutcome::Ignored | DispatchOutcome::Launched(false))
    }
}

impl HotkeyEngine {
    /// Показать, свернуть или запустить приложение, привязанное к `action`
    pub async fn dispatch(&self, action: ActionId) -> DispatchOutcome {
        self.dispatch_at(action, None).await
    }

    /// То же, что [`HotkeyEngine::dispatch`], но с временем нажатия от композитора.
    /// `None` или 0 означают "время неизвестно", тогда берётся текущее.
    pub async fn dispatch_at(&self, action: ActionId, timestamp: Option<u32>) -> DispatchOutcome {
        let Some(config) = self.bound_config(action) else {
            debug!("Нажатие {} не относится ни к одному приложению", action);
            return DispatchOutcome::Ignored;
        };
        let (Some(store), Some(suppressor)) = (self.config_store.clone(), self.suppressor.clone()) else {
            return DispatchOutcome::Ignored;
        };

        debug_if_enabled!("Обработка {} для {} ({})", action, config.id, config.name);

        let windows = match self.desktop.compositor.windows().await {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось получить список окон: {}", e);
                Vec::new()
            }
        };

        if self.move_or_hide(&config, &windows, &store, &suppressor).await {
            return DispatchOutcome::MovedOrHidden;
        }

        let timestamp = timestamp.filter(|timestamp| *timestamp != 0);
        if self.show(&config, &windows, timestamp, &store, &suppressor).await {
            return DispatchOutcome::Shown;
        }

        DispatchOutcome::Launched(store.directory().launch(&config.id))
    }

    fn is_app_match(name: &str, config: &AppConfig) -> bool {
        // Приложения сравниваются по отображаемому имени: другого
        // идентификатора трекер окон не даёт
        name == config.name
    }

    async fn move_or_hide(
        &self,
        config: &AppConfig,
        windows: &[WindowInfo],
        store: &ConfigStore,
        suppressor: &AnimationSuppressor,
    ) -> bool {
        let tracker = &self.desktop.tracker;

        let Some(app) = tracker.focus_app(windows) else {
            return false;
        };
        if !Self::is_app_match(&app.name, config) {
            return false;
        }
        let Some(window) = tracker.app_windows(&app, windows).into_iter().find(|window| window.has_focus) else {
            return false;
        };

        let compositor = &self.desktop.compositor;
        let result: Result<()> = suppressor
            .suppress(store.should_skip_animations(), async {
                let monitor = compositor.current_monitor().await?;

                if window.monitor != monitor {
                    debug!("Переносим {} на монитор {}", window, monitor);
                    compositor.move_to_monitor(window.id, monitor).await?;
                } else if window.can_minimize {
                    debug!("Сворачиваем {}", window);
                    compositor.minimize(window.id).await?;
                }
                Ok(())
            })
            .await;

        if let Err(e) = result {
            warn!("Не удалось перенести или свернуть {}: {}", window, e);
        }
        true
    }

    async fn show(
        &self,
        config: &AppConfig,
        windows: &[WindowInfo],
        timestamp: Option<u32>,
        store: &ConfigStore,
        suppressor: &AnimationSuppressor,
    ) -> bool {
        let tracker = &self.desktop.tracker;

        let Some(window) = windows.iter().filter(|window| !window.override_redirect).find(|window| {
            tracker
                .window_app(window)
                .is_some_and(|app| Self::is_app_match(&app.name, config))
        }) else {
            return false;
        };

        let compositor = &self.desktop.compositor;
        let result: Result<()> = suppressor
            .suppress(store.should_skip_animations(), async {
                let workspace = compositor.active_workspace().await?;
                if !window.is_on_workspace(workspace) {
                    compositor.change_workspace(window.id, workspace).await?;
                }

                let monitor = compositor.current_monitor().await?;
                if window.monitor != monitor {
                    compositor.move_to_monitor(window.id, monitor).await?;
                }

                let timestamp = timestamp.unwrap_or_else(|| compositor.current_time());
                compositor.activate(window.id, timestamp).await?;
                compositor.focus(window.id, timestamp).await?;
                debug!("Показано окно {}", window);
                Ok(())
            })
            .await;

        if let Err(e) = result {
            warn!("Не удалось показать {}: {}", window, e);
        }
        true
    }

    fn bound_config(&self, action: ActionId) -> Option<AppConfig> {
        self.generation()
            .and_then(|generation| generation.actions.get(&action))
            .map(|bound| bound.config.clone())
    }
}

