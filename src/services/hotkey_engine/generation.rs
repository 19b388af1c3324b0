use crate::events::{ActionId, AppConfig};
use crate::services::desktop::Desktop;
use crate::services::subscription::Subscription;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::warn;

/// Приложение, чьё сочетание захвачено у композитора
#[derive(Debug, Clone)]
pub struct BoundApp {
    pub config: AppConfig,
    pub binding_name: String,
}

/// Всё, что принадлежит одному поколению движка: захваты и подписки
///
/// Поколение никогда не изменяется при пересборке: старое целиком
/// разбирается, новое строится с нуля.
pub(super) struct Generation {
    pub id: u64,
    pub actions: HashMap<ActionId, BoundApp>,
    pub subscriptions: SmallVec<[Subscription; 3]>,
}

impl Generation {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            actions: HashMap::new(),
            subscriptions: SmallVec::new(),
        }
    }

    /// Отзывает разрешения, освобождает захваты и отменяет подписки
    pub async fn teardown(mut self, desktop: &Desktop) {
        for (action, bound) in self.actions.drain() {
            desktop.keybindings.revoke(&bound.binding_name);

            match desktop.compositor.ungrab_accelerator(action).await {
                Ok(true) => {}
                Ok(false) => warn!("Композитор не знал о захвате {} ({})", action, bound.config.hotkey),
                Err(e) => warn!("Не удалось освободить {} ({}): {}", action, bound.config.hotkey, e),
            }
        }

        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
    }
}

pub(super) enum EngineState {
    Uninitialized,
    Active(Generation),
    Disposed,
}
