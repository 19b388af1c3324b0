use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Маска модификаторов в раскладке битов GDK
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierMask: u32 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const ALT = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;
        const BUTTON4 = 1 << 11;
        const BUTTON5 = 1 << 12;
        const SUPER = 1 << 26;
        const HYPER = 1 << 27;
        const META = 1 << 28;
    }
}

impl ModifierMask {
    /// Все биты, которые тулкит считает модификаторами
    pub const MODIFIER_MASK: ModifierMask = ModifierMask::SHIFT
        .union(ModifierMask::LOCK)
        .union(ModifierMask::CONTROL)
        .union(ModifierMask::ALT)
        .union(ModifierMask::BUTTON1)
        .union(ModifierMask::BUTTON2)
        .union(ModifierMask::BUTTON3)
        .union(ModifierMask::BUTTON4)
        .union(ModifierMask::BUTTON5)
        .union(ModifierMask::SUPER)
        .union(ModifierMask::HYPER)
        .union(ModifierMask::META);

    /// Маска модификаторов, учитываемых в горячих клавишах по умолчанию
    pub const DEFAULT_MOD_MASK: ModifierMask = ModifierMask::SHIFT
        .union(ModifierMask::CONTROL)
        .union(ModifierMask::ALT)
        .union(ModifierMask::SUPER)
        .union(ModifierMask::HYPER)
        .union(ModifierMask::META);

    /// Нет модификаторов или зажат только Shift
    pub fn is_none_or_shift(&self) -> bool {
        self.is_empty() || *self == ModifierMask::SHIFT
    }
}

/// Код клавиши (keysym)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue(pub u32);

impl KeyValue {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Перехваченное нажатие: аппаратный код, keysym и модификаторы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedKey {
    pub key_code: u32,
    pub key_value: KeyValue,
    pub modifiers: ModifierMask,
}

impl CapturedKey {
    pub fn new(key_code: u32, key_value: u32, modifiers: ModifierMask) -> Self {
        Self {
            key_code,
            key_value: KeyValue(key_value),
            modifiers,
        }
    }

    /// Маскирует модификаторы так же, как диалог захвата сочетания: Lock никогда не учитывается
    pub fn normalized(mut self) -> Self {
        self.modifiers = (self.modifiers & ModifierMask::DEFAULT_MOD_MASK) - ModifierMask::LOCK;
        self
    }
}

impl fmt::Display for CapturedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keycode={} keyval={} mods={:#x}",
            self.key_code,
            self.key_value,
            self.modifiers.bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_or_shift() {
        assert!(ModifierMask::empty().is_none_or_shift());
        assert!(ModifierMask::SHIFT.is_none_or_shift());
        assert!(!(ModifierMask::SHIFT | ModifierMask::CONTROL).is_none_or_shift());
        assert!(!ModifierMask::SUPER.is_none_or_shift());
    }

    #[test]
    fn test_normalized_drops_lock_and_pointer_buttons() {
        let key = CapturedKey::new(
            30,
            0x61,
            ModifierMask::CONTROL | ModifierMask::LOCK | ModifierMask::BUTTON1 | ModifierMask::MOD2,
        )
        .normalized();

        assert_eq!(key.modifiers, ModifierMask::CONTROL);
    }
}
