use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Команда {tool} завершилась с ошибкой: {stderr}")]
    Command { tool: String, stderr: String },

    #[error("Некорректное сочетание клавиш: {0}")]
    InvalidAccelerator(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl HotkeyError {
    pub fn command(tool: impl Into<String>, stderr: impl Into<String>) -> Self {
        HotkeyError::Command {
            tool: tool.into(),
            stderr: stderr.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HotkeyError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! hotkey_error {
    (invalid_accelerator, $($arg:tt)*) => {
        $crate::error::HotkeyError::InvalidAccelerator(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::HotkeyError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::HotkeyError::Internal(format!($($arg)*))
    };
}
