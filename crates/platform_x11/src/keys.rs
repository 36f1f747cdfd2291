//! Keysym resolution and modifier parsing.
//!
//! Configuration names keys by keysym ("Return", "Tab", single latin
//! characters); grabs and event matching work on keycodes. The keymap is
//! fetched once at startup from the server's keyboard mapping.

use x11rb::protocol::xproto::ModMask;

/// X keysym value (latin-1 keysyms equal their codepoint).
pub type Keysym = u32;

const XK_RETURN: Keysym = 0xff0d;
const XK_TAB: Keysym = 0xff09;
const XK_ESCAPE: Keysym = 0xff1b;

/// Resolve a configuration key name to a keysym. Single printable ASCII
/// characters map directly; a handful of named keys cover the rest of the
/// binding surface.
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    match name {
        "Return" => Some(XK_RETURN),
        "Tab" => Some(XK_TAB),
        "Escape" => Some(XK_ESCAPE),
        "space" => Some(0x20),
        "grave" => Some(0x60),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_graphic() => Some(c as Keysym),
                _ => None,
            }
        }
    }
}

/// Resolve the configured modifier name to its X modifier mask.
pub fn modifier_from_name(name: &str) -> Option<ModMask> {
    match name {
        "mod1" => Some(ModMask::M1),
        "mod4" => Some(ModMask::M4),
        _ => None,
    }
}

/// Snapshot of the server's keysym table, queried once at startup.
#[derive(Debug, Clone)]
pub struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode: keysyms_per_keycode as usize,
            keysyms,
        }
    }

    /// Keycode whose unshifted (first-column) keysym matches.
    pub fn keycode_for(&self, keysym: Keysym) -> Option<u8> {
        if self.keysyms_per_keycode == 0 {
            return None;
        }
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .position(|row| row.first() == Some(&keysym))
            .map(|i| self.min_keycode + i as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_single_char_keysyms() {
        assert_eq!(keysym_from_name("Return"), Some(0xff0d));
        assert_eq!(keysym_from_name("Tab"), Some(0xff09));
        assert_eq!(keysym_from_name("q"), Some(0x71));
        assert_eq!(keysym_from_name("3"), Some(0x33));
        assert_eq!(keysym_from_name("NoSuchKey"), None);
        assert_eq!(keysym_from_name(""), None);
    }

    #[test]
    fn test_modifier_names() {
        assert_eq!(modifier_from_name("mod4"), Some(ModMask::M4));
        assert_eq!(modifier_from_name("mod1"), Some(ModMask::M1));
        assert_eq!(modifier_from_name("hyper"), None);
    }

    #[test]
    fn test_keycode_lookup_uses_first_column() {
        // Two keysyms per keycode: (a, A) at keycode 38, (b, B) at 39.
        let keymap = Keymap::new(38, 2, vec![0x61, 0x41, 0x62, 0x42]);
        assert_eq!(keymap.keycode_for(0x61), Some(38));
        assert_eq!(keymap.keycode_for(0x62), Some(39));
        // Shifted column is not matched.
        assert_eq!(keymap.keycode_for(0x41), None);
    }
}
