//! Проверка, годится ли нажатие в качестве глобального сочетания

use crate::events::{CapturedKey, ModifierMask};
use crate::mappings::keysyms::*;
use crate::mappings::{accelerator_name, accelerator_valid};

/// Диапазоны символов, которые набираются без модификаторов
const TYPABLE_RANGES: &[(u32, u32)] = &[
    (XK_a, XK_z),
    (XK_A, XK_Z),
    (XK_0, XK_9),
    (XK_kana_fullstop, XK_semivoicedsound),
    (XK_Arabic_comma, XK_Arabic_sukun),
    (XK_Serbian_dje, XK_Cyrillic_HARDSIGN),
    (XK_Greek_ALPHAaccent, XK_Greek_omega),
    (XK_hebrew_doublelowline, XK_hebrew_taf),
    (XK_Thai_kokai, XK_Thai_lekkao),
    (XK_Hangul_Kiyeog, XK_Hangul_J_YeorinHieuh),
];

/// Навигация, Tab, Enter и переключение раскладки
const FORBIDDEN_KEY_VALUES: &[u32] = &[
    XK_Home,
    XK_Left,
    XK_Up,
    XK_Right,
    XK_Down,
    XK_Page_Up,
    XK_Page_Down,
    XK_End,
    XK_Tab,
    XK_KP_Enter,
    XK_Return,
    XK_Mode_switch,
];

fn is_typable(key_value: u32) -> bool {
    TYPABLE_RANGES
        .iter()
        .any(|&(first, last)| (first..=last).contains(&key_value))
}

/// Допустимо ли нажатие `(key_code, key_value, modifiers)` как глобальное сочетание
///
/// Без модификаторов (или только с Shift) отклоняются печатаемые символы,
/// пробел без модификаторов и клавиши из [`FORBIDDEN_KEY_VALUES`]. Остальное
/// решает [`accelerator_valid`], с одним исключением: Tab с любым
/// модификатором разрешён.
pub fn is_valid_binding(key_code: u32, key_value: u32, modifiers: ModifierMask) -> bool {
    if modifiers.is_none_or_shift() && key_code != 0 {
        let bare_space = key_value == XK_space && modifiers.is_empty();

        if is_typable(key_value) || bare_space || FORBIDDEN_KEY_VALUES.contains(&key_value) {
            return false;
        }
    }

    accelerator_valid(key_value, modifiers) || (key_value == XK_Tab && !modifiers.is_empty())
}

/// Результат захвата сочетания в настройках
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Escape без модификаторов: оставить как было
    Cancel,
    /// BackSpace без модификаторов: убрать сочетание
    Clear,
    Set(String),
    Rejected,
}

pub fn capture_hotkey(key: CapturedKey) -> Capture {
    let key = key.normalized();
    let key_value = key.key_value.value();

    if key.modifiers.is_empty() && key_value == XK_Escape {
        return Capture::Cancel;
    }
    if key.modifiers.is_empty() && key_value == XK_BackSpace {
        return Capture::Clear;
    }

    if is_valid_binding(key.key_code, key_value, key.modifiers) {
        Capture::Set(accelerator_name(key_value, key.modifiers))
    } else {
        Capture::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYCODE_A: u32 = 38;
    const KEYCODE_TAB: u32 = 23;
    const KEYCODE_SPACE: u32 = 65;
    const KEYCODE_F5: u32 = 71;

    #[test]
    fn letters_need_a_real_modifier() {
        assert!(!is_valid_binding(KEYCODE_A, XK_a, ModifierMask::empty()));
        assert!(!is_valid_binding(KEYCODE_A, XK_a, ModifierMask::SHIFT));
        assert!(!is_valid_binding(KEYCODE_A, XK_A, ModifierMask::SHIFT));
        assert!(is_valid_binding(KEYCODE_A, XK_a, ModifierMask::SUPER));
        assert!(is_valid_binding(KEYCODE_A, XK_a, ModifierMask::CONTROL | ModifierMask::SHIFT));
    }

    #[test]
    fn tab_is_allowed_with_any_modifier() {
        assert!(is_valid_binding(KEYCODE_TAB, XK_Tab, ModifierMask::CONTROL));
        assert!(!is_valid_binding(KEYCODE_TAB, XK_Tab, ModifierMask::empty()));
        assert!(!is_valid_binding(KEYCODE_TAB, XK_Tab, ModifierMask::SHIFT));
        assert!(!accelerator_valid(XK_Tab, ModifierMask::CONTROL));
    }

    #[test]
    fn space_is_rejected_only_without_modifiers() {
        assert!(!is_valid_binding(KEYCODE_SPACE, XK_space, ModifierMask::empty()));
        assert!(is_valid_binding(KEYCODE_SPACE, XK_space, ModifierMask::SHIFT));
        assert!(is_valid_binding(KEYCODE_SPACE, XK_space, ModifierMask::ALT));
    }

    #[test]
    fn function_keys_are_valid_alone() {
        assert!(is_valid_binding(KEYCODE_F5, XK_F5, ModifierMask::empty()));
        assert!(is_valid_binding(KEYCODE_F5, XK_F5, ModifierMask::SHIFT));
    }

    #[test]
    fn navigation_and_script_keys_are_rejected_unmodified() {
        for key_value in [XK_Home, XK_End, XK_Page_Up, XK_Return, XK_KP_Enter, XK_Mode_switch] {
            assert!(!is_valid_binding(10, key_value, ModifierMask::empty()), "{:#x}", key_value);
        }

        // Кириллица и греческий
        assert!(!is_valid_binding(44, 0x6c1, ModifierMask::empty()));
        assert!(!is_valid_binding(44, 0x7e1, ModifierMask::SHIFT));
        assert!(is_valid_binding(44, 0x6c1, ModifierMask::CONTROL));
        assert!(is_valid_binding(113, XK_Left, ModifierMask::CONTROL));
    }

    #[test]
    fn zero_keycode_skips_typing_checks() {
        // Синтетические события без аппаратного кода решает только базовая проверка
        assert!(is_valid_binding(0, XK_a, ModifierMask::empty()));
        assert!(is_valid_binding(0, XK_Home, ModifierMask::empty()));
        assert!(!is_valid_binding(0, XK_Left, ModifierMask::empty()));
        assert!(!is_valid_binding(0, XK_Shift_L, ModifierMask::empty()));
    }

    #[test]
    fn capture_handles_escape_backspace_and_lock() {
        assert_eq!(capture_hotkey(CapturedKey::new(9, XK_Escape, ModifierMask::empty())), Capture::Cancel);
        assert_eq!(
            capture_hotkey(CapturedKey::new(22, XK_BackSpace, ModifierMask::LOCK)),
            Capture::Clear
        );
        assert_eq!(
            capture_hotkey(CapturedKey::new(KEYCODE_TAB, XK_Tab, ModifierMask::ALT | ModifierMask::LOCK)),
            Capture::Set("<Alt>Tab".to_string())
        );
        assert_eq!(
            capture_hotkey(CapturedKey::new(9, XK_Escape, ModifierMask::CONTROL)),
            Capture::Set("<Control>Escape".to_string())
        );
        assert_eq!(capture_hotkey(CapturedKey::new(KEYCODE_A, XK_a, ModifierMask::SHIFT)), Capture::Rejected);
    }
}
