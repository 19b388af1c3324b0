use super::r#trait::{ChangeCallback, SubscriptionId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Реестр обработчиков изменений, общий для всех хранилищ
#[derive(Default)]
pub(super) struct CallbackRegistry {
    next_id: AtomicU64,
    callbacks: DashMap<u64, (String, ChangeCallback)>,
}

impl CallbackRegistry {
    pub fn connect(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.callbacks.insert(id, (key.to_string(), callback));
        SubscriptionId(id)
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn notify(&self, key: &str) {
        // Сначала собираем обработчики: обработчик может сам (от)подписаться
        let mut matching: Vec<(u64, ChangeCallback)> = self
            .callbacks
            .iter()
            .filter(|entry| entry.value().0 == key)
            .map(|entry| (*entry.key(), entry.value().1.clone()))
            .collect();
        matching.sort_by_key(|(id, _)| *id);

        for (_, callback) in matching {
            callback(key);
        }
    }
}
