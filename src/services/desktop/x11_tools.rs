use crate::error::Result;
use crate::events::{MonitorIndex, WindowGeometry, WindowId, WindowInfo, WorkspaceIndex};
use crate::hotkey_error;
use crate::utils::run_tool;
use tracing::debug;

/// Операции над окнами через wmctrl, xdotool и xrandr
pub struct X11Tools;

impl Default for X11Tools {
    fn default() -> Self {
        Self::new()
    }
}

impl X11Tools {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        debug!("=== Тестируем wmctrl и xdotool ===");
        run_tool("wmctrl", &["-m"])?;
        run_tool("xdotool", &["version"])?;
        debug!("=== wmctrl и xdotool работают ===");
        Ok(())
    }

    pub async fn monitors(&self) -> Result<Vec<WindowGeometry>> {
        let stdout = run_tool("xrandr", &["--listmonitors"])?;
        Ok(parse_monitors(&stdout))
    }

    pub async fn windows(&self) -> Result<Vec<WindowInfo>> {
        let listing = run_tool("wmctrl", &["-l", "-G", "-p", "-x"])?;
        let focused = self.active_window_id().await.ok();
        let monitors = self.monitors().await.unwrap_or_default();

        let windows = parse_window_list(&listing)
            .into_iter()
            .map(|mut window| {
                window.has_focus = Some(window.id) == focused;
                if let Some(geometry) = window.geometry {
                    window.monitor = monitor_at(&monitors, geometry.center()).unwrap_or(0);
                }
                window
            })
            .collect();

        Ok(windows)
    }

    pub async fn active_window_id(&self) -> Result<WindowId> {
        let stdout = run_tool("xdotool", &["getactivewindow"])?;
        stdout
            .trim()
            .parse::<u64>()
            .map(WindowId)
            .map_err(|e| hotkey_error!(internal, "xdotool вернул некорректный id окна: {}", e))
    }

    /// Монитор, на котором находится указатель
    pub async fn current_monitor(&self) -> Result<MonitorIndex> {
        let stdout = run_tool("xdotool", &["getmouselocation", "--shell"])?;
        let pointer = parse_pointer(&stdout)
            .ok_or_else(|| hotkey_error!(internal, "не удалось разобрать положение указателя"))?;
        let monitors = self.monitors().await?;
        Ok(monitor_at(&monitors, pointer).unwrap_or(0))
    }

    pub async fn active_workspace(&self) -> Result<WorkspaceIndex> {
        let stdout = run_tool("wmctrl", &["-d"])?;
        parse_active_desktop(&stdout)
            .ok_or_else(|| hotkey_error!(internal, "wmctrl не сообщил активный рабочий стол"))
    }

    pub async fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        let monitors = self.monitors().await?;
        let target = usize::try_from(monitor)
            .ok()
            .and_then(|index| monitors.get(index))
            .ok_or_else(|| hotkey_error!(internal, "монитор {} не найден", monitor))?;

        let windows = self.windows().await?;
        let geometry = windows
            .iter()
            .find(|info| info.id == window)
            .and_then(|info| info.geometry)
            .ok_or_else(|| hotkey_error!(internal, "окно {} не найдено", window))?;

        // Сохраняем смещение окна относительно его текущего монитора
        let source = monitor_at(&monitors, geometry.center())
            .and_then(|index| monitors.get(index as usize))
            .copied()
            .unwrap_or(*target);
        let x = target.x + (geometry.x - source.x);
        let y = target.y + (geometry.y - source.y);

        run_tool("xdotool", &["windowmove", &window.0.to_string(), &x.to_string(), &y.to_string()])?;
        Ok(())
    }

    pub async fn minimize(&self, window: WindowId) -> Result<()> {
        run_tool("xdotool", &["windowminimize", &window.0.to_string()])?;
        Ok(())
    }

    pub async fn change_workspace(&self, window: WindowId, workspace: WorkspaceIndex) -> Result<()> {
        run_tool("wmctrl", &["-i", "-r", &format!("0x{:x}", window.0), "-t", &workspace.to_string()])?;
        Ok(())
    }

    pub async fn activate(&self, window: WindowId) -> Result<()> {
        run_tool("wmctrl", &["-i", "-a", &format!("0x{:x}", window.0)])?;
        Ok(())
    }

    pub async fn focus(&self, window: WindowId) -> Result<()> {
        run_tool("xdotool", &["windowfocus", &window.0.to_string()])?;
        Ok(())
    }
}

/// `wmctrl -l -G -p -x`: id, стол, pid, x, y, ширина, высота, класс, хост, заголовок
fn parse_window_list(listing: &str) -> Vec<WindowInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 9 {
                return None;
            }

            let id = u64::from_str_radix(parts[0].trim_start_matches("0x"), 16).ok()?;
            let desktop: i32 = parts[1].parse().ok()?;
            let pid: u32 = parts[2].parse().ok()?;
            let geometry = WindowGeometry {
                x: parts[3].parse().ok()?,
                y: parts[4].parse().ok()?,
                width: parts[5].parse().ok()?,
                height: parts[6].parse().ok()?,
            };
            let title = parts.get(9..).map(|rest| rest.join(" ")).unwrap_or_default();

            let mut window = WindowInfo::new(WindowId(id), title)
                .with_class(parts[7].to_string())
                .with_geometry(geometry)
                .on_workspace((desktop >= 0).then_some(desktop));
            if pid > 0 {
                window = window.with_pid(pid);
            }
            Some(window)
        })
        .collect()
}

/// `xrandr --listmonitors`: строки вида ` 1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1`
fn parse_monitors(stdout: &str) -> Vec<WindowGeometry> {
    stdout
        .lines()
        .skip_while(|line| line.starts_with("Monitors:"))
        .filter_map(|line| {
            let spec = line.split_whitespace().nth(2)?;
            let (size, offset) = spec.split_once('+')?;
            let (width, height) = size.split_once('x')?;
            let (x, y) = offset.split_once('+')?;

            Some(WindowGeometry {
                x: x.parse().ok()?,
                y: y.parse().ok()?,
                width: width.split('/').next()?.parse().ok()?,
                height: height.split('/').next()?.parse().ok()?,
            })
        })
        .collect()
}

fn parse_pointer(stdout: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in stdout.lines() {
        match line.split_once('=') {
            Some(("X", value)) => x = value.trim().parse().ok(),
            Some(("Y", value)) => y = value.trim().parse().ok(),
            _ => {}
        }
    }
    Some((x?, y?))
}

fn parse_active_desktop(stdout: &str) -> Option<WorkspaceIndex> {
    stdout.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let index = parts.next()?.parse().ok()?;
        (parts.next() == Some("*")).then_some(index)
    })
}

fn monitor_at(monitors: &[WindowGeometry], (x, y): (i32, i32)) -> Option<MonitorIndex> {
    monitors
        .iter()
        .position(|monitor| monitor.contains(x, y))
        .map(|index| index as MonitorIndex)
}
