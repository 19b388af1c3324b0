use parking_lot::Mutex;
use std::fmt;

type CancelFn = Box<dyn FnOnce() + Send>;

/// Подписка на внешний источник событий
///
/// Отмена выполняется явно через [`Subscription::cancel`]; повторная отмена
/// ничего не делает. Удаление значения подписку НЕ отменяет.
pub struct Subscription {
    label: &'static str,
    cancel: Mutex<Option<CancelFn>>,
}

impl Subscription {
    pub fn new(label: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Подписка, которую нечего отменять (например, в dry-run режиме)
    pub fn inert(label: &'static str) -> Self {
        Self {
            label,
            cancel: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// Возвращает `true`, если отмена действительно произошла
    pub fn cancel(&self) -> bool {
        let cancel = self.cancel.lock().take();
        match cancel {
            Some(cancel) => {
                cancel();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
