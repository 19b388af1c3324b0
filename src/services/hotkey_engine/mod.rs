//! Движок горячих клавиш: захват сочетаний у композитора, реакция на
//! нажатия и полная пересборка при изменении настроек или набора приложений.

mod dispatch;
mod generation;

pub use self::dispatch::DispatchOutcome;
pub use self::generation::BoundApp;

use self::generation::{EngineState, Generation};
use crate::debug_if_enabled;
use crate::events::{ActionId, AppConfig, EngineEvent, EngineEventKind};
use crate::services::animation_suppressor::AnimationSuppressor;
use crate::services::config_store::ConfigStore;
use crate::services::desktop::{ActionMode, Desktop, KeyBindingFlags};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub struct HotkeyEngine {
    desktop: Desktop,
    config_store: Option<Arc<ConfigStore>>,
    suppressor: Option<Arc<AnimationSuppressor>>,
    state: EngineState,
    last_generation: u64,
    events: UnboundedSender<EngineEvent>,
}

impl HotkeyEngine {
    /// Движок и канал, в который подписки доставляют события
    pub fn new(
        desktop: Desktop,
        config_store: Arc<ConfigStore>,
        suppressor: Arc<AnimationSuppressor>,
    ) -> (Self, UnboundedReceiver<EngineEvent>) {
        let (events, receiver) = unbounded_channel();

        let engine = Self {
            desktop,
            config_store: Some(config_store),
            suppressor: Some(suppressor),
            state: EngineState::Uninitialized,
            last_generation: 0,
            events,
        };

        (engine, receiver)
    }

    fn generation(&self) -> Option<&Generation> {
        match &self.state {
            EngineState::Active(generation) => Some(generation),
            _ => None,
        }
    }

    pub fn generation_id(&self) -> Option<u64> {
        self.generation().map(|generation| generation.id)
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, EngineState::Disposed)
    }

    /// Захваченные сочетания текущего поколения, по возрастанию номера действия
    pub fn live_bindings(&self) -> Vec<(ActionId, BoundApp)> {
        let mut bindings: Vec<(ActionId, BoundApp)> = self
            .generation()
            .map(|generation| {
                generation
                    .actions
                    .iter()
                    .map(|(action, bound)| (*action, bound.clone()))
                    .collect()
            })
            .unwrap_or_default();
        bindings.sort_by_key(|(action, _)| *action);
        bindings
    }

    /// Переход в Active: подписки нового поколения и захват всех сочетаний
    pub async fn init(&mut self) {
        let Some(store) = self.config_store.clone() else {
            warn!("Движок уже остановлен, инициализация пропущена");
            return;
        };

        if let EngineState::Active(previous) = std::mem::replace(&mut self.state, EngineState::Uninitialized) {
            previous.teardown(&self.desktop).await;
        }

        self.last_generation += 1;
        let mut generation = Generation::new(self.last_generation);
        self.subscribe(&mut generation, &store);

        let configs = store.load();
        for config in configs.into_iter().filter(AppConfig::has_hotkey) {
            self.register(&mut generation, config).await;
        }

        info!(
            "Поколение {}: захвачено сочетаний {}",
            generation.id,
            generation.actions.len()
        );
        self.state = EngineState::Active(generation);
    }

    fn subscribe(&self, generation: &mut Generation, store: &ConfigStore) {
        let id = generation.id;

        let events = self.events.clone();
        generation
            .subscriptions
            .push(self.desktop.inventory.connect_installed_changed(Arc::new(move || {
                let _ = events.send(EngineEvent::new(id, EngineEventKind::InstalledChanged));
            })));

        let events = self.events.clone();
        generation
            .subscriptions
            .push(self.desktop.compositor.connect_accelerator_activated(Arc::new(
                move |action, timestamp| {
                    let _ = events.send(EngineEvent::new(
                        id,
                        EngineEventKind::AcceleratorActivated { action, timestamp },
                    ));
                },
            )));

        let events = self.events.clone();
        generation.subscriptions.push(store.on_change(Arc::new(move |_| {
            let _ = events.send(EngineEvent::new(id, EngineEventKind::AppConfigsChanged));
        })));
    }

    async fn register(&self, generation: &mut Generation, config: AppConfig) {
        let compositor = &self.desktop.compositor;

        let action = match compositor.grab_accelerator(&config.hotkey, KeyBindingFlags::NONE).await {
            Ok(Some(action)) => action,
            Ok(None) => {
                warn!("Сочетание {} для {} недоступно или занято", config.hotkey, config.id);
                return;
            }
            Err(e) => {
                warn!("Не удалось захватить {} для {}: {}", config.hotkey, config.id, e);
                return;
            }
        };

        let binding_name = compositor.external_binding_name_for(action);
        self.desktop.keybindings.allow(&binding_name, ActionMode::NORMAL);

        debug_if_enabled!("{} -> {} ({})", config.hotkey, action, binding_name);
        generation.actions.insert(action, BoundApp { config, binding_name });
    }

    /// Разобрать текущее поколение и построить новое
    pub async fn rebuild(&mut self) {
        if !matches!(self.state, EngineState::Active(_)) {
            debug!("Пересборка пропущена: движок не активен");
            return;
        }

        info!("Пересборка привязок");
        self.init().await;
    }

    /// `None`, если событие не привело к обработке нажатия
    pub async fn handle_event(&mut self, event: EngineEvent) -> Option<DispatchOutcome> {
        if self.generation_id() != Some(event.generation) {
            debug!("Отброшено устаревшее событие: {}", event);
            return None;
        }

        debug_if_enabled!("Событие: {}", event);

        match event.kind {
            EngineEventKind::AcceleratorActivated { action, timestamp } => {
                Some(self.dispatch_at(action, Some(timestamp)).await)
            }
            EngineEventKind::InstalledChanged | EngineEventKind::AppConfigsChanged => {
                self.rebuild().await;
                None
            }
        }
    }

    /// Освобождает все захваты и подписки; повторный вызов ничего не делает
    pub async fn dispose(&mut self) {
        match std::mem::replace(&mut self.state, EngineState::Disposed) {
            EngineState::Disposed => return,
            EngineState::Active(generation) => generation.teardown(&self.desktop).await,
            EngineState::Uninitialized => {}
        }

        if let Some(store) = self.config_store.take() {
            store.dispose();
        }
        if let Some(suppressor) = self.suppressor.take() {
            suppressor.dispose();
        }

        info!("Движок горячих клавиш остановлен");
    }

    /// Цикл обработки событий до сигнала `shutdown`, затем dispose
    pub async fn run(mut self, mut events: UnboundedReceiver<EngineEvent>, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => {
                    let Some(event) = event else { break };

                    if let Some(outcome) = self.handle_event(event).await {
                        if !outcome.is_handled() {
                            debug!("Нажатие без результата: {:?}", outcome);
                        }
                    }
                }
            }
        }

        self.dispose().await;
    }
}
