use crate::error::{HotkeyError, Result};
use std::collections::HashMap;
use std::process::Command;
use tracing::debug;

/// Переменные окружения пользовательской сессии, если процесс запущен через sudo
fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = Command::new("id").args(["-u", &sudo_user]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);
                    let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                    debug!("Подставляем переменные окружения для пользователя {}: uid={}", sudo_user, uid);
                    env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

/// Команда внешней утилиты с окружением сессии пользователя
pub fn tool_command(tool: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(tool);
    cmd.args(args);

    // Строим подстановки на лету без глобального кэша
    for (key, value) in build_env_overrides() {
        cmd.env(key, value);
    }

    cmd
}

/// Запустить утилиту и вернуть её stdout
pub fn run_tool(tool: &str, args: &[&str]) -> Result<String> {
    let output = tool_command(tool, args).output().map_err(|e| {
        debug!("{} не найден или не запускается: {}", tool, e);
        HotkeyError::command(tool, format!("не удалось запустить: {}", e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!("{} {:?} вернул ошибку: {}", tool, args, stderr);
        return Err(HotkeyError::command(tool, stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
