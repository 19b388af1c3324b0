//! Константы keysym X11 и таблица их имён
#![allow(non_upper_case_globals)]

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const XK_space: u32 = 0x020;
pub const XK_0: u32 = 0x030;
pub const XK_9: u32 = 0x039;
pub const XK_A: u32 = 0x041;
pub const XK_Z: u32 = 0x05a;
pub const XK_a: u32 = 0x061;
pub const XK_z: u32 = 0x07a;

// Национальные раскладки
pub const XK_kana_fullstop: u32 = 0x4a1;
pub const XK_semivoicedsound: u32 = 0x4df;
pub const XK_Arabic_comma: u32 = 0x5ac;
pub const XK_Arabic_sukun: u32 = 0x5f2;
pub const XK_Serbian_dje: u32 = 0x6b1;
pub const XK_Cyrillic_HARDSIGN: u32 = 0x6ff;
pub const XK_Greek_ALPHAaccent: u32 = 0x7a1;
pub const XK_Greek_omega: u32 = 0x7f9;
pub const XK_hebrew_doublelowline: u32 = 0xcdf;
pub const XK_hebrew_taf: u32 = 0xcfa;
pub const XK_Thai_kokai: u32 = 0xda1;
pub const XK_Thai_lekkao: u32 = 0xdf9;
pub const XK_Hangul_Kiyeog: u32 = 0xea1;
pub const XK_Hangul_J_YeorinHieuh: u32 = 0xefa;

// Функциональные клавиши
pub const XK_BackSpace: u32 = 0xff08;
pub const XK_Tab: u32 = 0xff09;
pub const XK_Return: u32 = 0xff0d;
pub const XK_Pause: u32 = 0xff13;
pub const XK_Scroll_Lock: u32 = 0xff14;
pub const XK_Sys_Req: u32 = 0xff15;
pub const XK_Escape: u32 = 0xff1b;
pub const XK_Multi_key: u32 = 0xff20;
pub const XK_Home: u32 = 0xff50;
pub const XK_Left: u32 = 0xff51;
pub const XK_Up: u32 = 0xff52;
pub const XK_Right: u32 = 0xff53;
pub const XK_Down: u32 = 0xff54;
pub const XK_Page_Up: u32 = 0xff55;
pub const XK_Page_Down: u32 = 0xff56;
pub const XK_End: u32 = 0xff57;
pub const XK_Print: u32 = 0xff61;
pub const XK_Insert: u32 = 0xff63;
pub const XK_Menu: u32 = 0xff67;
pub const XK_Mode_switch: u32 = 0xff7e;
pub const XK_Num_Lock: u32 = 0xff7f;
pub const XK_KP_Tab: u32 = 0xff89;
pub const XK_KP_Enter: u32 = 0xff8d;
pub const XK_KP_Left: u32 = 0xff96;
pub const XK_KP_Up: u32 = 0xff97;
pub const XK_KP_Right: u32 = 0xff98;
pub const XK_KP_Down: u32 = 0xff99;
pub const XK_KP_Multiply: u32 = 0xffaa;
pub const XK_KP_Add: u32 = 0xffab;
pub const XK_KP_Subtract: u32 = 0xffad;
pub const XK_KP_Decimal: u32 = 0xffae;
pub const XK_KP_Divide: u32 = 0xffaf;
pub const XK_KP_0: u32 = 0xffb0;
pub const XK_F1: u32 = 0xffbe;
pub const XK_F5: u32 = 0xffc2;
pub const XK_F35: u32 = 0xffe0;
pub const XK_Shift_L: u32 = 0xffe1;
pub const XK_Shift_R: u32 = 0xffe2;
pub const XK_Control_L: u32 = 0xffe3;
pub const XK_Control_R: u32 = 0xffe4;
pub const XK_Caps_Lock: u32 = 0xffe5;
pub const XK_Shift_Lock: u32 = 0xffe6;
pub const XK_Meta_L: u32 = 0xffe7;
pub const XK_Meta_R: u32 = 0xffe8;
pub const XK_Alt_L: u32 = 0xffe9;
pub const XK_Alt_R: u32 = 0xffea;
pub const XK_Super_L: u32 = 0xffeb;
pub const XK_Super_R: u32 = 0xffec;
pub const XK_Hyper_L: u32 = 0xffed;
pub const XK_Hyper_R: u32 = 0xffee;
pub const XK_Delete: u32 = 0xffff;

// Расширения ISO и XKB
pub const XK_ISO_Lock: u32 = 0xfe01;
pub const XK_ISO_Level3_Shift: u32 = 0xfe03;
pub const XK_ISO_Next_Group: u32 = 0xfe08;
pub const XK_ISO_Prev_Group: u32 = 0xfe0a;
pub const XK_ISO_First_Group: u32 = 0xfe0c;
pub const XK_ISO_Last_Group: u32 = 0xfe0e;
pub const XK_ISO_Left_Tab: u32 = 0xfe20;
pub const XK_AudibleBell_Enable: u32 = 0xfe7a;
pub const XK_First_Virtual_Screen: u32 = 0xfed0;
pub const XK_Prev_Virtual_Screen: u32 = 0xfed1;
pub const XK_Next_Virtual_Screen: u32 = 0xfed2;
pub const XK_Last_Virtual_Screen: u32 = 0xfed4;
pub const XK_Terminate_Server: u32 = 0xfed5;

/// Keysym для произвольного символа Unicode вне Latin-1
const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

static NAMED_KEYSYMS: &[(&str, u32)] = &[
    ("space", XK_space),
    ("exclam", 0x021),
    ("quotedbl", 0x022),
    ("numbersign", 0x023),
    ("dollar", 0x024),
    ("percent", 0x025),
    ("ampersand", 0x026),
    ("apostrophe", 0x027),
    ("parenleft", 0x028),
    ("parenright", 0x029),
    ("asterisk", 0x02a),
    ("plus", 0x02b),
    ("comma", 0x02c),
    ("minus", 0x02d),
    ("period", 0x02e),
    ("slash", 0x02f),
    ("colon", 0x03a),
    ("semicolon", 0x03b),
    ("less", 0x03c),
    ("equal", 0x03d),
    ("greater", 0x03e),
    ("question", 0x03f),
    ("at", 0x040),
    ("bracketleft", 0x05b),
    ("backslash", 0x05c),
    ("bracketright", 0x05d),
    ("asciicircum", 0x05e),
    ("underscore", 0x05f),
    ("grave", 0x060),
    ("braceleft", 0x07b),
    ("bar", 0x07c),
    ("braceright", 0x07d),
    ("asciitilde", 0x07e),
    ("BackSpace", XK_BackSpace),
    ("Tab", XK_Tab),
    ("Return", XK_Return),
    ("Pause", XK_Pause),
    ("Scroll_Lock", XK_Scroll_Lock),
    ("Sys_Req", XK_Sys_Req),
    ("Escape", XK_Escape),
    ("Multi_key", XK_Multi_key),
    ("Home", XK_Home),
    ("Left", XK_Left),
    ("Up", XK_Up),
    ("Right", XK_Right),
    ("Down", XK_Down),
    ("Page_Up", XK_Page_Up),
    ("Page_Down", XK_Page_Down),
    ("End", XK_End),
    ("Print", XK_Print),
    ("Insert", XK_Insert),
    ("Menu", XK_Menu),
    ("Mode_switch", XK_Mode_switch),
    ("Num_Lock", XK_Num_Lock),
    ("KP_Tab", XK_KP_Tab),
    ("KP_Enter", XK_KP_Enter),
    ("KP_Left", XK_KP_Left),
    ("KP_Up", XK_KP_Up),
    ("KP_Right", XK_KP_Right),
    ("KP_Down", XK_KP_Down),
    ("KP_Multiply", XK_KP_Multiply),
    ("KP_Add", XK_KP_Add),
    ("KP_Subtract", XK_KP_Subtract),
    ("KP_Decimal", XK_KP_Decimal),
    ("KP_Divide", XK_KP_Divide),
    ("Shift_L", XK_Shift_L),
    ("Shift_R", XK_Shift_R),
    ("Control_L", XK_Control_L),
    ("Control_R", XK_Control_R),
    ("Caps_Lock", XK_Caps_Lock),
    ("Shift_Lock", XK_Shift_Lock),
    ("Meta_L", XK_Meta_L),
    ("Meta_R", XK_Meta_R),
    ("Alt_L", XK_Alt_L),
    ("Alt_R", XK_Alt_R),
    ("Super_L", XK_Super_L),
    ("Super_R", XK_Super_R),
    ("Hyper_L", XK_Hyper_L),
    ("Hyper_R", XK_Hyper_R),
    ("Delete", XK_Delete),
    ("ISO_Left_Tab", XK_ISO_Left_Tab),
    ("ISO_Level3_Shift", XK_ISO_Level3_Shift),
    ("XF86AudioLowerVolume", 0x1008_ff11),
    ("XF86AudioMute", 0x1008_ff12),
    ("XF86AudioRaiseVolume", 0x1008_ff13),
    ("XF86AudioPlay", 0x1008_ff14),
    ("XF86AudioStop", 0x1008_ff15),
    ("XF86AudioPrev", 0x1008_ff16),
    ("XF86AudioNext", 0x1008_ff17),
    ("XF86HomePage", 0x1008_ff18),
    ("XF86Mail", 0x1008_ff19),
    ("XF86Search", 0x1008_ff1b),
    ("XF86Calculator", 0x1008_ff1d),
];

/// Синонимы, которые принимаются при разборе, но не выдаются при форматировании
static KEYSYM_ALIASES: &[(&str, u32)] = &[
    ("Prior", XK_Page_Up),
    ("Next", XK_Page_Down),
    ("Enter", XK_Return),
    ("Esc", XK_Escape),
];

static NAME_TO_KEYSYM: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    let mut map = HashMap::new();

    for (name, keysym) in NAMED_KEYSYMS.iter().chain(KEYSYM_ALIASES) {
        map.insert(name.to_lowercase(), *keysym);
    }

    for offset in 0..=(XK_Z - XK_A) {
        let upper = XK_A + offset;
        let lower = XK_a + offset;
        map.insert(char::from(lower as u8).to_string(), lower);
        // Заглавная буква разбирается в строчную, как это делает тулкит
        map.entry(char::from(upper as u8).to_string()).or_insert(lower);
    }

    for digit in XK_0..=XK_9 {
        map.insert(char::from(digit as u8).to_string(), digit);
    }

    for index in 0..=(XK_F35 - XK_F1) {
        map.insert(format!("f{}", index + 1), XK_F1 + index);
    }

    for index in 0..10 {
        map.insert(format!("kp_{}", index), XK_KP_0 + index);
    }

    map
});

static KEYSYM_TO_NAME: Lazy<HashMap<u32, String>> = Lazy::new(|| {
    let mut map: HashMap<u32, String> = NAMED_KEYSYMS
        .iter()
        .map(|(name, keysym)| (*keysym, name.to_string()))
        .collect();

    for keysym in (XK_a..=XK_z).chain(XK_0..=XK_9) {
        map.insert(keysym, char::from(keysym as u8).to_string());
    }

    for index in 0..=(XK_F35 - XK_F1) {
        map.insert(XK_F1 + index, format!("F{}", index + 1));
    }

    for index in 0..10 {
        map.insert(XK_KP_0 + index, format!("KP_{}", index));
    }

    map
});

/// Получить keysym по имени (регистр имён функциональных клавиш не важен)
pub fn keysym_from_name(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }

    // Буквы различаются по регистру только на уровне ввода, A и a дают одну клавишу
    if let Some(keysym) = NAME_TO_KEYSYM.get(name) {
        return Some(*keysym);
    }

    if let Some(keysym) = NAME_TO_KEYSYM.get(&name.to_lowercase()) {
        return Some(*keysym);
    }

    if let Some(hex) = name.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok();
    }

    if let Some(hex) = name.strip_prefix('U') {
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .map(unicode_to_keysym);
        }
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(unicode_to_keysym(ch.to_lowercase().next().unwrap_or(ch) as u32)),
        _ => None,
    }
}

/// Каноническое имя keysym для строки сочетания
pub fn keysym_name(keysym: u32) -> String {
    if let Some(name) = KEYSYM_TO_NAME.get(&keysym) {
        return name.clone();
    }

    if keysym > UNICODE_KEYSYM_OFFSET && keysym <= UNICODE_KEYSYM_OFFSET + 0x10_ffff {
        return format!("U{:04X}", keysym - UNICODE_KEYSYM_OFFSET);
    }

    format!("0x{:x}", keysym)
}

/// Приведение keysym к нижнему регистру (только латиница)
pub fn keysym_to_lower(keysym: u32) -> u32 {
    if (XK_A..=XK_Z).contains(&keysym) {
        keysym + (XK_a - XK_A)
    } else {
        keysym
    }
}

fn unicode_to_keysym(codepoint: u32) -> u32 {
    if (0x20..=0x7e).contains(&codepoint) || (0xa0..=0xff).contains(&codepoint) {
        codepoint
    } else {
        UNICODE_KEYSYM_OFFSET + codepoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_digits_and_function_keys() {
        assert_eq!(keysym_from_name("a"), Some(XK_a));
        assert_eq!(keysym_from_name("A"), Some(XK_a));
        assert_eq!(keysym_from_name("7"), Some(0x37));
        assert_eq!(keysym_from_name("F5"), Some(XK_F5));
        assert_eq!(keysym_from_name("f12"), Some(XK_F1 + 11));
        assert_eq!(keysym_name(XK_F5), "F5");
        assert_eq!(keysym_name(XK_a), "a");
    }

    #[test]
    fn test_navigation_and_aliases() {
        assert_eq!(keysym_from_name("Page_Up"), Some(XK_Page_Up));
        assert_eq!(keysym_from_name("Prior"), Some(XK_Page_Up));
        assert_eq!(keysym_from_name("return"), Some(XK_Return));
        assert_eq!(keysym_from_name("Tab"), Some(XK_Tab));
        assert_eq!(keysym_name(XK_Page_Down), "Page_Down");
        assert_eq!(keysym_name(XK_KP_Enter), "KP_Enter");
    }

    #[test]
    fn test_unicode_keysyms() {
        // Кириллическая "а" вне Latin-1 кодируется через смещение Unicode
        assert_eq!(keysym_from_name("U0430"), Some(0x0100_0430));
        assert_eq!(keysym_from_name("а"), Some(0x0100_0430));
        assert_eq!(keysym_name(0x0100_0430), "U0430");
        assert_eq!(keysym_from_name("0xff09"), Some(XK_Tab));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(keysym_from_name(""), None);
        assert_eq!(keysym_from_name("NotAKey"), None);
        assert_eq!(keysym_name(0xfd01), "0xfd01");
    }
}
