use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна у композитора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

pub type MonitorIndex = i32;
pub type WorkspaceIndex = i32;

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub class: String,
    pub pid: Option<u32>,
    pub monitor: MonitorIndex,
    /// `None` для окон, закреплённых на всех рабочих столах
    pub workspace: Option<WorkspaceIndex>,
    pub geometry: Option<WindowGeometry>,
    pub has_focus: bool,
    pub override_redirect: bool,
    pub can_minimize: bool,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: String) -> Self {
        Self {
            id,
            title,
            class: String::new(),
            pid: None,
            monitor: 0,
            workspace: Some(0),
            geometry: None,
            has_focus: false,
            override_redirect: false,
            can_minimize: true,
        }
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.class = class;
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn on_monitor(mut self, monitor: MonitorIndex) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn on_workspace(mut self, workspace: Option<WorkspaceIndex>) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_geometry(mut self, geometry: WindowGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn focused(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    #[cfg(test)]
    pub fn override_redirect(mut self) -> Self {
        self.override_redirect = true;
        self
    }

    /// Окно видно на активном рабочем столе (закреплённые окна видны всегда)
    pub fn is_on_workspace(&self, active: WorkspaceIndex) -> bool {
        self.workspace.map_or(true, |workspace| workspace == active)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "{} \"{}\"", self.id, self.title)
        } else {
            write!(f, "{} \"{}\" ({})", self.id, self.title, self.class)
        }
    }
}

/// Геометрия окна или монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && (x as i64) < self.x as i64 + self.width as i64
            && (y as i64) < self.y as i64 + self.height as i64
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

/// Приложение, которому трекер окон приписал окно
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedApp {
    /// `None` для приложений без desktop-файла
    pub id: Option<String>,
    pub name: String,
}

impl TrackedApp {
    pub fn new(id: Option<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_creation() {
        let window = WindowInfo::new(WindowId(0x3a00007), "Terminal".to_string())
            .with_class("org.gnome.Terminal".to_string())
            .with_pid(1234)
            .on_monitor(1);

        assert_eq!(window.class, "org.gnome.Terminal");
        assert_eq!(window.pid, Some(1234));
        assert_eq!(window.monitor, 1);
        assert_eq!(window.to_string(), "0x03a00007 \"Terminal\" (org.gnome.Terminal)");
    }

    #[test]
    fn test_sticky_window_is_on_every_workspace() {
        let sticky = WindowInfo::new(WindowId(1), "Panel".to_string()).on_workspace(None);
        let pinned = WindowInfo::new(WindowId(2), "Editor".to_string()).on_workspace(Some(2));

        assert!(sticky.is_on_workspace(0));
        assert!(sticky.is_on_workspace(3));
        assert!(pinned.is_on_workspace(2));
        assert!(!pinned.is_on_workspace(0));
    }

    #[test]
    fn test_geometry_contains_and_center() {
        let monitor = WindowGeometry { x: 1920, y: 0, width: 2560, height: 1440 };

        assert!(monitor.contains(1920, 0));
        assert!(!monitor.contains(1919, 10));
        assert!(!monitor.contains(4480, 10));
        assert_eq!(monitor.center(), (3200, 720));
    }
}
