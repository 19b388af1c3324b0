//! Внешние сервисы рабочего стола: композитор, разрешения привязок,
//! трекер окон и каталог установленных приложений.
//!
//! Модуль только описывает границу и реализует backends. Решения о том,
//! что делать по нажатию, принимает исключительно HotkeyEngine.

mod desktop_entries;
mod dry_run;
mod gnome_shell;
mod r#trait;
mod x11_tools;

#[cfg(test)]
pub mod fake;

pub use self::desktop_entries::{DesktopEntryInventory, DesktopEntryTracker};
pub use self::dry_run::{DryRunCompositor, DryRunInventory};
pub use self::gnome_shell::GnomeShellCompositor;
pub use self::r#trait::{
    create_desktop, AcceleratorCallback, ActionMode, AppInventory, Compositor, Desktop, InstalledCallback,
    InventoryEntry, KeyBindingFlags, KeybindingGate, LocalKeybindingGate, WindowTracker,
};
pub use self::x11_tools::X11Tools;
