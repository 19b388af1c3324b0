use super::r#trait::{AppInventory, InstalledCallback, InventoryEntry, WindowTracker};
use crate::error::Result;
use crate::events::{TrackedApp, WindowInfo};
use crate::hotkey_error;
use crate::services::subscription::Subscription;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Снимок каталогов приложений: файл и время его изменения
type Snapshot = Vec<(PathBuf, Option<SystemTime>)>;

#[derive(Default)]
struct InventoryIndex {
    entries: HashMap<String, InventoryEntry>,
    // Те же записи, отсортированные по id, для сопоставления окон
    by_id: Vec<InventoryEntry>,
    snapshot: Snapshot,
}

/// Каталог приложений по desktop-файлам из каталогов XDG
pub struct DesktopEntryInventory {
    dirs: Vec<PathBuf>,
    poll_interval: Duration,
    index: Arc<RwLock<InventoryIndex>>,
}

impl DesktopEntryInventory {
    pub fn new(dirs: Vec<PathBuf>, poll_interval: Duration) -> Self {
        let dirs = if dirs.is_empty() { xdg_application_dirs() } else { dirs };
        let inventory = Self {
            dirs,
            poll_interval,
            index: Arc::new(RwLock::new(InventoryIndex::default())),
        };

        let count = refresh_index(&inventory.dirs, &inventory.index);
        info!("Каталог приложений: {} записей в {} каталогах", count.1, inventory.dirs.len());

        inventory
    }

    /// Пересканировать каталоги; `true`, если набор файлов изменился
    pub fn refresh(&self) -> bool {
        refresh_index(&self.dirs, &self.index).0
    }
}

impl AppInventory for DesktopEntryInventory {
    fn all(&self) -> Vec<InventoryEntry> {
        self.index.read().entries.values().cloned().collect()
    }

    fn lookup(&self, app_id: &str) -> Option<InventoryEntry> {
        self.index.read().entries.get(app_id).cloned()
    }

    fn launch(&self, entry: &InventoryEntry) -> Result<()> {
        let exec = entry
            .exec
            .as_deref()
            .ok_or_else(|| hotkey_error!(internal, "у {} нет строки Exec", entry.id))?;

        let argv = exec_to_argv(exec);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| hotkey_error!(internal, "пустая строка Exec у {}", entry.id))?;

        info!("Запуск {} ({})", entry.id, program);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        spawn_reaped(&entry.id, command)
    }

    fn connect_installed_changed(&self, callback: InstalledCallback) -> Subscription {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("Нет tokio runtime, изменения каталога приложений отслеживаться не будут");
                return Subscription::inert("installed-changed");
            }
        };

        let dirs = self.dirs.clone();
        let index = Arc::clone(&self.index);
        let period = self.poll_interval;

        let handle = runtime.spawn(async move {
            let mut ticker = interval(period);
            // Первый тик срабатывает сразу, а индекс уже свежий
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let (changed, count) = refresh_index(&dirs, &index);
                if changed {
                    info!("Набор установленных приложений изменился ({} записей)", count);
                    callback();
                }
            }
        });

        Subscription::new("installed-changed", move || handle.abort())
    }
}

/// Запускает процесс и дожидается его завершения в фоне, чтобы не оставлять зомби
fn spawn_reaped(app_id: &str, mut command: Command) -> Result<()> {
    let app_id = app_id.to_string();

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            let mut child = tokio::process::Command::from(command).spawn()?;
            runtime.spawn(async move {
                match child.wait().await {
                    Ok(status) => debug!("{} завершился: {}", app_id, status),
                    Err(e) => warn!("Не удалось дождаться завершения {}: {}", app_id, e),
                }
            });
        }
        Err(_) => {
            let mut child = command.spawn()?;
            std::thread::spawn(move || match child.wait() {
                Ok(status) => debug!("{} завершился: {}", app_id, status),
                Err(e) => warn!("Не удалось дождаться завершения {}: {}", app_id, e),
            });
        }
    }

    Ok(())
}

fn refresh_index(dirs: &[PathBuf], index: &RwLock<InventoryIndex>) -> (bool, usize) {
    let snapshot = take_snapshot(dirs);

    if index.read().snapshot == snapshot && !snapshot.is_empty() {
        return (false, index.read().entries.len());
    }

    let entries = scan_entries(dirs);
    let count = entries.len();

    let mut by_id: Vec<InventoryEntry> = entries.values().cloned().collect();
    by_id.sort_by(|a, b| a.id.cmp(&b.id));

    let mut guard = index.write();
    let changed = guard.snapshot != snapshot;
    guard.entries = entries;
    guard.by_id = by_id;
    guard.snapshot = snapshot;

    (changed, count)
}

fn take_snapshot(dirs: &[PathBuf]) -> Snapshot {
    let mut snapshot = Vec::new();
    for dir in dirs {
        for (_, path) in desktop_files(dir) {
            let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();
            snapshot.push((path, modified));
        }
    }
    snapshot.sort();
    snapshot
}

fn scan_entries(dirs: &[PathBuf]) -> HashMap<String, InventoryEntry> {
    let mut entries = HashMap::new();

    // Более ранний каталог имеет приоритет
    for dir in dirs {
        for (id, path) in desktop_files(dir) {
            if entries.contains_key(&id) {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(content) => {
                    if let Some(entry) = parse_desktop_entry(&id, &content) {
                        entries.insert(id, entry);
                    }
                }
                Err(e) => debug!("Не удалось прочитать {:?}: {}", path, e),
            }
        }
    }

    entries
}

/// Все desktop-файлы каталога с их desktop id (подкаталоги склеиваются через `-`)
fn desktop_files(root: &Path) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(read_dir) = fs::read_dir(&dir) else {
            continue;
        };

        for item in read_dir.flatten() {
            let path = item.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }

            if path.extension().and_then(|ext| ext.to_str()) != Some("desktop") {
                continue;
            }

            if let Ok(relative) = path.strip_prefix(root) {
                let id = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("-");
                found.push((id, path));
            }
        }
    }

    found.sort();
    found
}

fn parse_desktop_entry(id: &str, content: &str) -> Option<InventoryEntry> {
    let mut in_main_group = false;
    let mut fields: HashMap<&str, &str> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }

        if !in_main_group {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            // Локализованные ключи вида Name[ru] не используются
            if !key.contains('[') {
                fields.entry(key).or_insert(value.trim());
            }
        }
    }

    if fields.get("Type").copied() != Some("Application") {
        return None;
    }

    // Hidden=true означает, что запись удалена
    if fields.get("Hidden").copied() == Some("true") {
        return None;
    }

    let name = fields.get("Name")?.to_string();
    let non_empty = |key: &str| fields.get(key).filter(|value| !value.is_empty()).map(|value| value.to_string());

    Some(InventoryEntry {
        id: id.to_string(),
        name,
        description: non_empty("Comment"),
        icon: non_empty("Icon"),
        should_show: fields.get("NoDisplay").copied() != Some("true"),
        exec: non_empty("Exec"),
        startup_wm_class: non_empty("StartupWMClass"),
    })
}

/// Разбить строку Exec на аргументы и убрать коды полей (`%f`, `%U`, ...)
fn exec_to_argv(exec: &str) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '%' => match chars.next() {
                Some('%') => current.push('%'),
                Some(_) | None => has_token = has_token || !current.is_empty(),
            },
            c if c.is_whitespace() && !in_quotes => {
                if has_token || !current.is_empty() {
                    argv.push(std::mem::take(&mut current));
                }
                has_token = false;
            }
            c => current.push(c),
        }
    }

    if has_token || !current.is_empty() {
        argv.push(current);
    }

    argv.retain(|arg| !arg.is_empty());
    argv
}

fn xdg_application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(data_home) = dirs::data_dir() {
        dirs.push(data_home.join("applications"));
    }

    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());

    for dir in data_dirs.split(':').filter(|dir| !dir.is_empty()) {
        dirs.push(PathBuf::from(dir).join("applications"));
    }

    dirs
}

/// Трекер окон по desktop-файлам: WM_CLASS сопоставляется с записью каталога
pub struct DesktopEntryTracker {
    inventory: Arc<DesktopEntryInventory>,
}

impl DesktopEntryTracker {
    pub fn new(inventory: Arc<DesktopEntryInventory>) -> Self {
        Self { inventory }
    }
}

impl WindowTracker for DesktopEntryTracker {
    fn window_app(&self, window: &WindowInfo) -> Option<TrackedApp> {
        if window.class.is_empty() && window.title.is_empty() {
            return None;
        }

        // wmctrl отдаёт WM_CLASS как "instance.Class"
        let class_parts: Vec<&str> = window
            .class
            .split('.')
            .filter(|part| !part.is_empty())
            .collect();
        let matches_class = |candidate: &str| {
            class_parts.iter().any(|part| part.eq_ignore_ascii_case(candidate))
                || window.class.eq_ignore_ascii_case(candidate)
        };

        let index = self.inventory.index.read();
        let entries = &index.by_id;

        let by_wm_class = entries.iter().find(|entry| {
            entry
                .startup_wm_class
                .as_deref()
                .is_some_and(|wm_class| matches_class(wm_class))
        });

        let by_id = || {
            entries.iter().find(|entry| {
                let stem = entry.id.strip_suffix(".desktop").unwrap_or(&entry.id);
                matches_class(stem)
            })
        };

        if let Some(entry) = by_wm_class.or_else(by_id) {
            return Some(TrackedApp::new(Some(entry.id.clone()), entry.name.clone()));
        }

        // Приложение без desktop-файла называется по классу окна
        let name = class_parts.last().copied().unwrap_or(window.title.as_str());
        Some(TrackedApp::new(None, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowId;

    fn write_entry(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_entry(
            dir.path(),
            "org.gnome.Terminal.desktop",
            "[Desktop Entry]\nType=Application\nName=Terminal\nName[ru]=Терминал\nComment=Use the command line\nIcon=org.gnome.Terminal\nExec=gnome-terminal --window %U\nStartupWMClass=Gnome-terminal\n\n[Desktop Action new-window]\nName=New Window\nExec=gnome-terminal --window\n",
        );
        write_entry(
            dir.path(),
            "kde/dolphin.desktop",
            "[Desktop Entry]\nType=Application\nName=Dolphin\nExec=dolphin %u\n",
        );
        write_entry(
            dir.path(),
            "hidden-helper.desktop",
            "[Desktop Entry]\nType=Application\nName=Helper\nNoDisplay=true\nExec=helper\n",
        );
        write_entry(
            dir.path(),
            "removed.desktop",
            "[Desktop Entry]\nType=Application\nName=Removed\nHidden=true\n",
        );
        write_entry(dir.path(), "link.desktop", "[Desktop Entry]\nType=Link\nName=Link\nURL=https://example.org\n");
        dir
    }

    #[test]
    fn scans_and_parses_desktop_entries() {
        let dir = sample_dir();
        let inventory = DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1));

        let terminal = inventory.lookup("org.gnome.Terminal.desktop").unwrap();
        assert_eq!(terminal.name, "Terminal");
        assert_eq!(terminal.description.as_deref(), Some("Use the command line"));
        assert_eq!(terminal.icon.as_deref(), Some("org.gnome.Terminal"));
        assert_eq!(terminal.startup_wm_class.as_deref(), Some("Gnome-terminal"));
        assert!(terminal.should_show);

        assert!(inventory.lookup("kde-dolphin.desktop").is_some());
        assert!(!inventory.lookup("hidden-helper.desktop").unwrap().should_show);
        assert!(inventory.lookup("removed.desktop").is_none());
        assert!(inventory.lookup("link.desktop").is_none());
        assert_eq!(inventory.all().len(), 3);
    }

    #[test]
    fn refresh_detects_new_files() {
        let dir = sample_dir();
        let inventory = DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1));
        assert!(!inventory.refresh());

        write_entry(dir.path(), "new.desktop", "[Desktop Entry]\nType=Application\nName=New\nExec=new\n");
        assert!(inventory.refresh());
        assert!(inventory.lookup("new.desktop").is_some());
    }

    #[test]
    fn exec_field_codes_are_stripped() {
        assert_eq!(exec_to_argv("gnome-terminal --window %U"), vec!["gnome-terminal", "--window"]);
        assert_eq!(exec_to_argv("\"/opt/My App/app\" %f --pct=100%%"), vec!["/opt/My App/app", "--pct=100%"]);
        assert_eq!(exec_to_argv("env FOO=1 app %i %c %k"), vec!["env", "FOO=1", "app"]);
    }

    /// Дочерние процессы текущего процесса в состоянии Z
    fn zombie_children() -> usize {
        let own_pid = std::process::id().to_string();
        fs::read_dir("/proc")
            .unwrap()
            .filter_map(|entry| fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // После имени процесса в скобках: состояние, затем ppid
                let fields: Vec<&str> = stat
                    .rsplit_once(')')
                    .map(|(_, rest)| rest.split_whitespace().collect())
                    .unwrap_or_default();
                fields.first() == Some(&"Z") && fields.get(1) == Some(&own_pid.as_str())
            })
            .count()
    }

    #[tokio::test]
    async fn launched_processes_are_reaped() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "quick.desktop", "[Desktop Entry]\nType=Application\nName=Quick\nExec=true %U\n");
        let inventory = DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1));
        let entry = inventory.lookup("quick.desktop").unwrap();

        for _ in 0..3 {
            inventory.launch(&entry).unwrap();
        }

        let mut zombies = usize::MAX;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            zombies = zombie_children();
            if zombies == 0 {
                break;
            }
        }
        assert_eq!(zombies, 0);
    }

    #[test]
    fn launch_without_runtime_is_reaped_too() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "quick.desktop", "[Desktop Entry]\nType=Application\nName=Quick\nExec=true\n");
        let inventory = DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1));

        inventory.launch(&inventory.lookup("quick.desktop").unwrap()).unwrap();

        let mut zombies = usize::MAX;
        for _ in 0..40 {
            std::thread::sleep(Duration::from_millis(50));
            zombies = zombie_children();
            if zombies == 0 {
                break;
            }
        }
        assert_eq!(zombies, 0);
    }

    #[test]
    fn tracker_maps_windows_by_wm_class_and_desktop_id() {
        let dir = sample_dir();
        let inventory = Arc::new(DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1)));
        let tracker = DesktopEntryTracker::new(inventory);

        let terminal = WindowInfo::new(WindowId(1), "bash".to_string()).with_class("gnome-terminal-server.Gnome-terminal".to_string());
        assert_eq!(
            tracker.window_app(&terminal),
            Some(TrackedApp::new(Some("org.gnome.Terminal.desktop".to_string()), "Terminal"))
        );

        let dolphin = WindowInfo::new(WindowId(2), "Home".to_string()).with_class("kde-dolphin.kde-dolphin".to_string());
        assert_eq!(tracker.window_app(&dolphin).unwrap().name, "Dolphin");

        let unknown = WindowInfo::new(WindowId(3), "Thing".to_string()).with_class("thing.Thing".to_string());
        assert_eq!(tracker.window_app(&unknown), Some(TrackedApp::new(None, "Thing")));
    }

    #[test]
    fn tracker_follows_refreshed_inventory_in_id_order() {
        let dir = sample_dir();
        let inventory = Arc::new(DesktopEntryInventory::new(vec![dir.path().to_path_buf()], Duration::from_secs(1)));
        let tracker = DesktopEntryTracker::new(inventory.clone());

        write_entry(
            dir.path(),
            "zz-terminal.desktop",
            "[Desktop Entry]\nType=Application\nName=Other Terminal\nExec=zz\nStartupWMClass=Gnome-terminal\n",
        );
        write_entry(dir.path(), "thing.desktop", "[Desktop Entry]\nType=Application\nName=Thing App\nExec=thing\n");
        assert!(inventory.refresh());

        // При нескольких совпадениях побеждает меньший id
        let terminal = WindowInfo::new(WindowId(1), "bash".to_string()).with_class("gnome-terminal-server.Gnome-terminal".to_string());
        assert_eq!(tracker.window_app(&terminal).unwrap().name, "Terminal");

        let thing = WindowInfo::new(WindowId(3), "Thing".to_string()).with_class("thing.Thing".to_string());
        assert_eq!(
            tracker.window_app(&thing),
            Some(TrackedApp::new(Some("thing.desktop".to_string()), "Thing App"))
        );
    }
}
