//! Key combinations like `Mod4+Shift+Return` and the key bindings built from them

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use x11rb::protocol::xproto::{KeyButMask, ModMask};

use crate::errors::ParseComboError;

/// Modifiers in the order they are printed
const MODIFIERS: &[(&str, ModMask)] = &[
    ("Shift", ModMask::SHIFT),
    ("Lock", ModMask::LOCK),
    ("Control", ModMask::CONTROL),
    ("Mod1", ModMask::M1),
    ("Mod2", ModMask::M2),
    ("Mod3", ModMask::M3),
    ("Mod4", ModMask::M4),
    ("Mod5", ModMask::M5),
];

const ALIASES: &[(&str, &str)] = &[("Ctrl", "Control"), ("Alt", "Mod1"), ("Super", "Mod4")];

const RELEASE: &str = "Release";

/// Drop the bits of a key or button state that never take part in a binding
pub(crate) fn clean_mask(mask: u16) -> u16 {
    // TODO: num lock is not always Mod2, read the modifier mapping instead
    mask & !u16::from(KeyButMask::MOD2 | KeyButMask::LOCK)
        & u16::from(
            KeyButMask::SHIFT
                | KeyButMask::CONTROL
                | KeyButMask::MOD1
                | KeyButMask::MOD3
                | KeyButMask::MOD4
                | KeyButMask::MOD5,
        )
}

pub(crate) fn parse_modifier(name: &str) -> Option<u16> {
    let name = ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, real)| *real)
        .unwrap_or(name);
    MODIFIERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, mask)| u16::from(*mask))
}

pub(crate) fn format_modifiers(mods: u16) -> Vec<&'static str> {
    MODIFIERS
        .iter()
        .filter(|(_, mask)| mods & u16::from(*mask) != 0)
        .map(|(name, _)| *name)
        .collect()
}

/// Split a combination at `+` and `-`, the separators X tools use interchangeably
pub(crate) fn split_combo(s: &str) -> Result<Vec<&str>, ParseComboError> {
    let parts = s.split(|c| c == '+' || c == '-').collect::<Vec<_>>();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ParseComboError::Empty);
    }
    Ok(parts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct KeyCombo {
    pub(crate) mods: u16,
    pub(crate) keysym: u32,
    pub(crate) release: bool,
}

impl FromStr for KeyCombo {
    type Err = ParseComboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_combo(s)?;
        let (key, modifiers) = parts.split_last().ok_or(ParseComboError::Empty)?;
        let mut combo = KeyCombo {
            mods: 0,
            keysym: keysym_from_name(key).ok_or_else(|| ParseComboError::KeySym(key.to_string()))?,
            release: false,
        };
        for name in modifiers {
            if *name == RELEASE {
                combo.release = true;
                continue;
            }
            combo.mods |= parse_modifier(name)
                .ok_or_else(|| ParseComboError::Modifier(name.to_string()))?;
        }
        Ok(combo)
    }
}

impl Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.release {
            write!(f, "{}-", RELEASE)?;
        }
        for m in format_modifiers(self.mods) {
            write!(f, "{}+", m)?;
        }
        match keysym_name(self.keysym) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:x}", self.keysym),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyBind {
    pub(crate) combo: KeyCombo,
    pub(crate) command: Vec<String>,
}

/// The keysyms that can be used by name
const KEYSYMS: &[(&str, u32)] = &[
    ("space", 0x20),
    ("exclam", 0x21),
    ("quotedbl", 0x22),
    ("numbersign", 0x23),
    ("dollar", 0x24),
    ("percent", 0x25),
    ("ampersand", 0x26),
    ("apostrophe", 0x27),
    ("parenleft", 0x28),
    ("parenright", 0x29),
    ("asterisk", 0x2a),
    ("plus", 0x2b),
    ("comma", 0x2c),
    ("minus", 0x2d),
    ("period", 0x2e),
    ("slash", 0x2f),
    ("colon", 0x3a),
    ("semicolon", 0x3b),
    ("less", 0x3c),
    ("equal", 0x3d),
    ("greater", 0x3e),
    ("question", 0x3f),
    ("at", 0x40),
    ("bracketleft", 0x5b),
    ("backslash", 0x5c),
    ("bracketright", 0x5d),
    ("asciicircum", 0x5e),
    ("underscore", 0x5f),
    ("grave", 0x60),
    ("braceleft", 0x7b),
    ("bar", 0x7c),
    ("braceright", 0x7d),
    ("asciitilde", 0x7e),
    ("BackSpace", 0xff08),
    ("Tab", 0xff09),
    ("Return", 0xff0d),
    ("Pause", 0xff13),
    ("Scroll_Lock", 0xff14),
    ("Escape", 0xff1b),
    ("Home", 0xff50),
    ("Left", 0xff51),
    ("Up", 0xff52),
    ("Right", 0xff53),
    ("Down", 0xff54),
    ("Prior", 0xff55),
    ("Page_Up", 0xff55),
    ("Next", 0xff56),
    ("Page_Down", 0xff56),
    ("End", 0xff57),
    ("Print", 0xff61),
    ("Insert", 0xff63),
    ("Menu", 0xff67),
    ("Num_Lock", 0xff7f),
    ("KP_Enter", 0xff8d),
    ("KP_Add", 0xffab),
    ("KP_Subtract", 0xffad),
    ("Delete", 0xffff),
    ("Caps_Lock", 0xffe5),
    ("XF86MonBrightnessUp", 0x1008_ff02),
    ("XF86MonBrightnessDown", 0x1008_ff03),
    ("XF86AudioLowerVolume", 0x1008_ff11),
    ("XF86AudioMute", 0x1008_ff12),
    ("XF86AudioRaiseVolume", 0x1008_ff13),
    ("XF86AudioPlay", 0x1008_ff14),
    ("XF86AudioStop", 0x1008_ff15),
    ("XF86AudioPrev", 0x1008_ff16),
    ("XF86AudioNext", 0x1008_ff17),
    ("XF86AudioMicMute", 0x1008_ffb2),
];

pub(crate) fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // Latin-1 characters are their own keysym
        if c.is_ascii_alphanumeric() {
            return Some(c as u32);
        }
    }
    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=35).contains(&n) {
            return Some(0xffbe + n - 1);
        }
    }
    if let Some(hex) = name.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16).ok();
    }
    KEYSYMS.iter().find(|(n, _)| *n == name).map(|(_, sym)| *sym)
}

pub(crate) fn keysym_name(keysym: u32) -> Option<String> {
    if let Some(c) = char::from_u32(keysym).filter(|c| c.is_ascii_alphanumeric()) {
        return Some(c.to_string());
    }
    if (0xffbe..0xffbe + 35).contains(&keysym) {
        return Some(format!("F{}", keysym - 0xffbe + 1));
    }
    KEYSYMS
        .iter()
        .find(|(_, sym)| *sym == keysym)
        .map(|(name, _)| name.to_string())
}

/// Names offered when completing a key combination
pub(crate) fn completion_words() -> Vec<String> {
    let mut words = MODIFIERS
        .iter()
        .map(|(name, _)| format!("{}+", name))
        .chain(ALIASES.iter().map(|(name, _)| format!("{}+", name)))
        .collect::<Vec<_>>();
    words.push(format!("{}-", RELEASE));
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print() {
        let combo = "Mod1+x".parse::<KeyCombo>().unwrap();
        assert_eq!(combo.mods, u16::from(ModMask::M1));
        assert_eq!(combo.keysym, 'x' as u32);
        assert!(!combo.release);
        assert_eq!(combo.to_string(), "Mod1+x");

        let combo = "Release-Mod1+x".parse::<KeyCombo>().unwrap();
        assert!(combo.release);
        assert_eq!(combo.to_string(), "Release-Mod1+x");

        // modifier order and aliases are normalized
        let combo = "Super-Shift-Return".parse::<KeyCombo>().unwrap();
        assert_eq!(combo.to_string(), "Shift+Mod4+Return");
        assert_eq!("Mod4+F12".parse::<KeyCombo>().unwrap().to_string(), "Mod4+F12");
    }

    #[test]
    fn bad_combos() {
        assert_eq!(
            "Hyper+x".parse::<KeyCombo>(),
            Err(ParseComboError::Modifier("Hyper".into()))
        );
        assert_eq!(
            "Mod1+nosuchkey".parse::<KeyCombo>(),
            Err(ParseComboError::KeySym("nosuchkey".into()))
        );
        assert_eq!("Mod1+".parse::<KeyCombo>(), Err(ParseComboError::Empty));
    }

    #[test]
    fn lock_and_numlock_are_ignored() {
        let state = u16::from(KeyButMask::MOD1 | KeyButMask::MOD2 | KeyButMask::LOCK);
        assert_eq!(clean_mask(state), u16::from(ModMask::M1));
    }
}
