pub mod animation_suppressor;
pub mod app_directory;
pub mod binding_validator;
pub mod config_store;
pub mod desktop;
pub mod hotkey_engine;
pub mod settings;
pub mod subscription;

pub use animation_suppressor::{AnimationHook, AnimationSuppressor, NoopAnimationHook, SettingsAnimationHook};
pub use app_directory::AppDirectory;
pub use binding_validator::is_valid_binding;
pub use config_store::ConfigStore;
pub use desktop::create_desktop;
pub use hotkey_engine::{DispatchOutcome, HotkeyEngine};
pub use subscription::Subscription;
