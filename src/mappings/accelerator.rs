//! Разбор и форматирование строк сочетаний вида `<Control><Alt>t`

use super::keysyms::{self, *};
use crate::error::Result;
use crate::events::ModifierMask;
use crate::hotkey_error;

/// Клавиши, которые никогда не могут быть сочетанием
const INVALID_ACCELERATOR_VALUES: &[u32] = &[
    XK_Shift_L,
    XK_Shift_R,
    XK_Shift_Lock,
    XK_Caps_Lock,
    XK_ISO_Lock,
    XK_Control_L,
    XK_Control_R,
    XK_Meta_L,
    XK_Meta_R,
    XK_Alt_L,
    XK_Alt_R,
    XK_Super_L,
    XK_Super_R,
    XK_Hyper_L,
    XK_Hyper_R,
    XK_ISO_Level3_Shift,
    XK_ISO_Next_Group,
    XK_ISO_Prev_Group,
    XK_ISO_First_Group,
    XK_ISO_Last_Group,
    XK_Mode_switch,
    XK_Num_Lock,
    XK_Multi_key,
    XK_Scroll_Lock,
    XK_Sys_Req,
    XK_Tab,
    XK_ISO_Left_Tab,
    XK_KP_Tab,
    XK_First_Virtual_Screen,
    XK_Prev_Virtual_Screen,
    XK_Next_Virtual_Screen,
    XK_Last_Virtual_Screen,
    XK_Terminate_Server,
    XK_AudibleBell_Enable,
];

/// Клавиши, допустимые только вместе с модификатором
const INVALID_UNMODIFIED_VALUES: &[u32] = &[
    XK_Up, XK_Down, XK_Left, XK_Right, XK_KP_Up, XK_KP_Down, XK_KP_Left, XK_KP_Right,
];

/// Стандартная проверка допустимости сочетания, как в тулките рабочего стола
pub fn accelerator_valid(key_value: u32, modifiers: ModifierMask) -> bool {
    let modifiers = modifiers & ModifierMask::MODIFIER_MASK;

    if key_value <= 0xff {
        return key_value >= 0x20;
    }

    if INVALID_ACCELERATOR_VALUES.contains(&key_value) {
        return false;
    }

    if modifiers.is_empty() && INVALID_UNMODIFIED_VALUES.contains(&key_value) {
        return false;
    }

    true
}

/// Маска модификаторов, которую диалог захвата применяет к нажатию
pub fn default_mod_mask() -> ModifierMask {
    ModifierMask::DEFAULT_MOD_MASK
}

/// Разобрать строку сочетания в keysym и маску модификаторов
pub fn parse_accelerator(accelerator: &str) -> Result<(u32, ModifierMask)> {
    let mut modifiers = ModifierMask::empty();
    let mut rest = accelerator.trim();

    while let Some(stripped) = rest.strip_prefix('<') {
        let end = stripped.find('>').ok_or_else(|| {
            hotkey_error!(invalid_accelerator, "незакрытый модификатор в '{}'", accelerator)
        })?;

        let token = &stripped[..end];
        modifiers |= modifier_from_token(token).ok_or_else(|| {
            hotkey_error!(invalid_accelerator, "неизвестный модификатор <{}> в '{}'", token, accelerator)
        })?;

        rest = &stripped[end + 1..];
    }

    if rest.is_empty() {
        return Err(hotkey_error!(invalid_accelerator, "нет клавиши в '{}'", accelerator));
    }

    let key_value = keysyms::keysym_from_name(rest).ok_or_else(|| {
        hotkey_error!(invalid_accelerator, "неизвестная клавиша '{}' в '{}'", rest, accelerator)
    })?;

    Ok((keysyms::keysym_to_lower(key_value), modifiers))
}

/// Каноническая строка сочетания, которую понимает композитор
pub fn accelerator_name(key_value: u32, modifiers: ModifierMask) -> String {
    let mut name = String::new();

    for (flag, token) in MODIFIER_NAMES {
        if modifiers.contains(*flag) {
            name.push('<');
            name.push_str(token);
            name.push('>');
        }
    }

    name.push_str(&keysyms::keysym_name(keysyms::keysym_to_lower(key_value)));
    name
}

static MODIFIER_NAMES: &[(ModifierMask, &str)] = &[
    (ModifierMask::SHIFT, "Shift"),
    (ModifierMask::CONTROL, "Control"),
    (ModifierMask::ALT, "Alt"),
    (ModifierMask::MOD2, "Mod2"),
    (ModifierMask::MOD3, "Mod3"),
    (ModifierMask::MOD4, "Mod4"),
    (ModifierMask::MOD5, "Mod5"),
    (ModifierMask::SUPER, "Super"),
    (ModifierMask::HYPER, "Hyper"),
    (ModifierMask::META, "Meta"),
];

fn modifier_from_token(token: &str) -> Option<ModifierMask> {
    let modifier = match token.to_lowercase().as_str() {
        "shift" | "shft" => ModifierMask::SHIFT,
        "control" | "ctrl" | "ctl" | "primary" => ModifierMask::CONTROL,
        "alt" | "mod1" => ModifierMask::ALT,
        "mod2" => ModifierMask::MOD2,
        "mod3" => ModifierMask::MOD3,
        "mod4" => ModifierMask::MOD4,
        "mod5" => ModifierMask::MOD5,
        "super" => ModifierMask::SUPER,
        "hyper" => ModifierMask::HYPER,
        "meta" => ModifierMask::META,
        _ => return None,
    };

    Some(modifier)
}
