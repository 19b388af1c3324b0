pub mod accelerator;
pub mod keysyms;

pub use accelerator::{accelerator_name, accelerator_valid, default_mod_mask, parse_accelerator};
