use super::command::deserialize_command;
use serde::Deserialize;
use x11::{keysym, xlib};

pub use super::command::Command;

#[derive(Clone, Debug, Deserialize)]
pub struct Bind {
    pub key: String,
    #[serde(deserialize_with = "deserialize_command")]
    pub command: Command,
    /// Overrides the global modifier for this bind.
    #[serde(default)]
    pub modifier: Option<String>,
}

/// Modifier bits that take part in matching a key press. Lock and NumLock
/// are left out; binds are grabbed under every combination of them (see
/// [`lock_variants`]).
pub const MODIFIER_MASK: u32 =
    xlib::ShiftMask | xlib::ControlMask | xlib::Mod1Mask | xlib::Mod4Mask;

/// NumLock is Mod2 on practically every keymap.
const NUM_LOCK_MASK: u32 = xlib::Mod2Mask;

/// `modifiers` combined with every state of CapsLock and NumLock. X only
/// delivers a passive grab on an exact modifier match, so each one is
/// grabbed separately.
pub fn lock_variants(modifiers: u32) -> [u32; 4] {
    [
        modifiers,
        modifiers | xlib::LockMask,
        modifiers | NUM_LOCK_MASK,
        modifiers | xlib::LockMask | NUM_LOCK_MASK,
    ]
}

pub fn get_keysym_for_key(key: &str) -> Option<u64> {
    let sym = match key.to_lowercase().as_str() {
        "a" => keysym::XK_a,
        "b" => keysym::XK_b,
        "c" => keysym::XK_c,
        "d" => keysym::XK_d,
        "e" => keysym::XK_e,
        "f" => keysym::XK_f,
        "g" => keysym::XK_g,
        "h" => keysym::XK_h,
        "i" => keysym::XK_i,
        "j" => keysym::XK_j,
        "k" => keysym::XK_k,
        "l" => keysym::XK_l,
        "m" => keysym::XK_m,
        "n" => keysym::XK_n,
        "o" => keysym::XK_o,
        "p" => keysym::XK_p,
        "q" => keysym::XK_q,
        "r" => keysym::XK_r,
        "s" => keysym::XK_s,
        "t" => keysym::XK_t,
        "u" => keysym::XK_u,
        "v" => keysym::XK_v,
        "w" => keysym::XK_w,
        "x" => keysym::XK_x,
        "y" => keysym::XK_y,
        "z" => keysym::XK_z,
        "0" => keysym::XK_0,
        "1" => keysym::XK_1,
        "2" => keysym::XK_2,
        "3" => keysym::XK_3,
        "4" => keysym::XK_4,
        "5" => keysym::XK_5,
        "6" => keysym::XK_6,
        "7" => keysym::XK_7,
        "8" => keysym::XK_8,
        "9" => keysym::XK_9,
        "space" => keysym::XK_space,
        "return" | "enter" => keysym::XK_Return,
        "tab" => keysym::XK_Tab,
        "escape" => keysym::XK_Escape,
        _ => return None,
    };

    Some(sym.into())
}

pub fn get_modifier(modifier: &str) -> u32 {
    modifier
        .split('+')
        .map(|m| match m.trim().to_lowercase().as_str() {
            "alt" => xlib::Mod1Mask,
            "ctrl" | "control" => xlib::ControlMask,
            "shift" => xlib::ShiftMask,
            "super" | "win" => xlib::Mod4Mask,
            _ => xlib::Mod1Mask,
        })
        .fold(0, |acc, mask| acc | mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_modifiers() {
        assert_eq!(
            get_modifier("ctrl+alt"),
            xlib::ControlMask | xlib::Mod1Mask
        );
        assert_eq!(get_modifier(" Super "), xlib::Mod4Mask);
    }

    #[test]
    fn lock_variants_cover_caps_and_num_lock() {
        let base = xlib::ControlMask | xlib::Mod1Mask;
        let variants = lock_variants(base);

        for state in [
            base,
            base | xlib::LockMask,
            base | xlib::Mod2Mask,
            base | xlib::LockMask | xlib::Mod2Mask,
        ] {
            assert!(variants.contains(&state));
            assert_eq!(state & MODIFIER_MASK, base);
        }
    }

    #[test]
    fn enter_and_return_are_the_same_key() {
        assert_eq!(get_keysym_for_key("Enter"), get_keysym_for_key("return"));
        assert_eq!(
            get_keysym_for_key("return"),
            Some(u64::from(keysym::XK_Return))
        );
    }

    #[test]
    fn unknown_key_has_no_keysym() {
        assert_eq!(get_keysym_for_key("hyper"), None);
    }
}
