use super::registry::CallbackRegistry;
use super::r#trait::{ChangeCallback, SettingValue, SettingsService, SubscriptionId};
use crate::error::Result;
use crate::utils::{run_tool, tool_command};
use dashmap::DashMap;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Настройки GSettings через утилиту `gsettings`
pub struct GSettingsCli {
    schema: String,
    defaults: HashMap<String, SettingValue>,
    registry: Arc<CallbackRegistry>,
    monitors: DashMap<u64, JoinHandle<()>>,
}

impl GSettingsCli {
    pub fn new(schema: impl Into<String>, defaults: Vec<(&'static str, SettingValue)>) -> Self {
        Self {
            schema: schema.into(),
            defaults: defaults
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            registry: Arc::new(CallbackRegistry::default()),
            monitors: DashMap::new(),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match run_tool("gsettings", &["get", &self.schema, key]) {
            Ok(stdout) => Some(stdout.trim().to_string()),
            Err(e) => {
                warn!("Не удалось прочитать {} {}: {}", self.schema, key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        run_tool("gsettings", &["set", &self.schema, key, value])?;
        Ok(())
    }

    fn spawn_monitor(&self, key: &str) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("Нет tokio runtime, изменения {} {} отслеживаться не будут", self.schema, key);
                return None;
            }
        };

        let mut command = tokio::process::Command::from(tool_command("gsettings", &["monitor", &self.schema, key]));
        command.stdout(Stdio::piped()).kill_on_drop(true);

        let registry = Arc::clone(&self.registry);
        let key = key.to_string();
        let schema = self.schema.clone();

        Some(runtime.spawn(async move {
            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    warn!("Не удалось запустить gsettings monitor для {} {}: {}", schema, key, e);
                    return;
                }
            };

            let Some(stdout) = child.stdout.take() else {
                return;
            };

            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("gsettings monitor: {}", line);
                registry.notify(&key);
            }

            debug!("gsettings monitor для {} {} завершён", schema, key);
        }))
    }
}

impl SettingsService for GSettingsCli {
    fn get_bool(&self, key: &str) -> bool {
        match self.read(key).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => self
                .defaults
                .get(key)
                .and_then(SettingValue::as_bool)
                .unwrap_or(false),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.write(key, if value { "true" } else { "false" })
    }

    fn get_string_list(&self, key: &str) -> Vec<String> {
        self.read(key)
            .and_then(|text| parse_string_array(&text))
            .or_else(|| {
                self.defaults
                    .get(key)
                    .and_then(|value| value.as_string_list().map(<[String]>::to_vec))
            })
            .unwrap_or_default()
    }

    fn set_string_list(&self, key: &str, value: &[String]) -> Result<()> {
        self.write(key, &format_string_array(value))
    }

    fn connect_changed(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        let id = self.registry.connect(key, callback);
        if let Some(handle) = self.spawn_monitor(key) {
            self.monitors.insert(id.0, handle);
        }
        id
    }

    fn disconnect(&self, id: SubscriptionId) {
        self.registry.disconnect(id);
        if let Some((_, handle)) = self.monitors.remove(&id.0) {
            handle.abort();
        }
    }
}

impl Drop for GSettingsCli {
    fn drop(&mut self) {
        for entry in self.monitors.iter() {
            entry.value().abort();
        }
    }
}

/// Разбор текстового GVariant `as`: `['a', 'b']` или `@as []`
fn parse_string_array(text: &str) -> Option<Vec<String>> {
    let text = text.trim();
    let text = text.strip_prefix("@as").map(str::trim).unwrap_or(text);
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let quote = match chars.next() {
            None => break,
            Some(quote @ ('\'' | '"')) => quote,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
    }

    Some(items)
}

fn format_string_array(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}
