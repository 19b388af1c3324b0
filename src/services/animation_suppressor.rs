use crate::error::Result;
use crate::services::settings::{subscribe, SettingsService, KEY_ENABLE_ANIMATIONS};
use crate::services::subscription::Subscription;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Точка, через которую отключаются анимации окон
pub trait AnimationHook: Send + Sync {
    fn can_override(&self) -> bool;

    fn override_animations(&self) -> Result<()>;

    fn restore_animations(&self) -> Result<()>;
}

/// Выключает анимации флагом `enable-animations` в настройках интерфейса
pub struct SettingsAnimationHook {
    settings: Arc<dyn SettingsService>,
}

impl SettingsAnimationHook {
    pub fn new(settings: Arc<dyn SettingsService>) -> Self {
        Self { settings }
    }
}

impl AnimationHook for SettingsAnimationHook {
    fn can_override(&self) -> bool {
        true
    }

    fn override_animations(&self) -> Result<()> {
        self.settings.set_bool(KEY_ENABLE_ANIMATIONS, false)
    }

    fn restore_animations(&self) -> Result<()> {
        self.settings.set_bool(KEY_ENABLE_ANIMATIONS, true)
    }
}

/// Анимации не трогаются (dry-run)
pub struct NoopAnimationHook;

impl AnimationHook for NoopAnimationHook {
    fn can_override(&self) -> bool {
        false
    }

    fn override_animations(&self) -> Result<()> {
        Ok(())
    }

    fn restore_animations(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct SuppressorState {
    overridden: bool,
    restore_task: Option<JoinHandle<()>>,
    // Номер последнего запланированного восстановления
    restore_seq: u64,
    disposed: bool,
}

/// Временно отключает анимации вокруг одной операции с окном
///
/// Восстановление откладывается на `restore_delay`: анимация запускается
/// композитором уже после возврата из вызова.
pub struct AnimationSuppressor {
    interface: Arc<dyn SettingsService>,
    hook: Arc<dyn AnimationHook>,
    restore_delay: Duration,
    state: Arc<Mutex<SuppressorState>>,
    // Кэш `enable-animations`, сбрасывается по уведомлению об изменении
    enabled_cache: Arc<RwLock<Option<bool>>>,
    subscription: Subscription,
}

impl AnimationSuppressor {
    pub fn new(interface: Arc<dyn SettingsService>, hook: Arc<dyn AnimationHook>, restore_delay: Duration) -> Self {
        let enabled_cache = Arc::new(RwLock::new(None));

        let cache = Arc::clone(&enabled_cache);
        let subscription = subscribe(
            &interface,
            KEY_ENABLE_ANIMATIONS,
            Arc::new(move |_| {
                *cache.write() = None;
            }),
        );

        Self {
            interface,
            hook,
            restore_delay,
            state: Arc::new(Mutex::new(SuppressorState::default())),
            enabled_cache,
            subscription,
        }
    }

    /// Включены ли анимации (наше собственное отключение не считается)
    pub fn animations_enabled(&self) -> bool {
        if self.state.lock().overridden {
            return true;
        }

        if let Some(enabled) = *self.enabled_cache.read() {
            return enabled;
        }

        let enabled = self.interface.get_bool(KEY_ENABLE_ANIMATIONS);
        *self.enabled_cache.write() = Some(enabled);
        enabled
    }

    pub fn is_overridden(&self) -> bool {
        self.state.lock().overridden
    }

    /// Выполнить `operation`, при необходимости отключив анимации на время её выполнения
    pub async fn suppress<F, T>(&self, should_suppress: bool, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let disposed = self.state.lock().disposed;
        if !should_suppress || disposed || !self.animations_enabled() || !self.hook.can_override() {
            return operation.await;
        }

        if !self.install_override() {
            return operation.await;
        }

        let result = operation.await;
        self.schedule_restore();
        result
    }

    fn install_override(&self) -> bool {
        let mut state = self.state.lock();

        if let Some(task) = state.restore_task.take() {
            task.abort();
        }
        state.restore_seq += 1;

        if state.overridden {
            return true;
        }

        match self.hook.override_animations() {
            Ok(()) => {
                debug!("Анимации временно отключены");
                state.overridden = true;
                true
            }
            Err(e) => {
                warn!("Не удалось отключить анимации: {}", e);
                false
            }
        }
    }

    fn schedule_restore(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            restore_now(&mut self.state.lock(), self.hook.as_ref());
            return;
        };

        let mut state = self.state.lock();
        let seq = state.restore_seq;
        let delay = self.restore_delay;
        let shared = Arc::clone(&self.state);
        let hook = Arc::clone(&self.hook);

        state.restore_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = shared.lock();
            if state.restore_seq == seq {
                state.restore_task = None;
                restore_now(&mut state, hook.as_ref());
            }
        }));
    }

    /// Отменяет отложенное восстановление и сразу возвращает анимации
    pub fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;

            if let Some(task) = state.restore_task.take() {
                task.abort();
            }
            restore_now(&mut state, self.hook.as_ref());
        }

        self.subscription.cancel();
        *self.enabled_cache.write() = None;
    }
}

fn restore_now(state: &mut SuppressorState, hook: &dyn AnimationHook) {
    if !state.overridden {
        return;
    }

    match hook.restore_animations() {
        Ok(()) => debug!("Анимации восстановлены"),
        Err(e) => warn!("Не удалось восстановить анимации: {}", e),
    }
    state.overridden = false;
}
