//! Physical input identifiers -> guest key/button codes.
//!
//! Key names are DOM `KeyboardEvent.code` values, codes are GLFW key numbers (what a
//! raylib build expects). The tables are an allow-list: anything missing is dropped.

use crate::abi::mouse_buttons;

/// Map a physical mouse button (DOM `MouseEvent.button`) to a guest button code.
pub fn mouse_button(physical: u16) -> Option<i32> {
    match physical {
        0 => Some(mouse_buttons::LEFT),
        2 => Some(mouse_buttons::RIGHT),
        1 => Some(mouse_buttons::MIDDLE),
        _ => None,
    }
}

/// Map a physical key code to a guest key code.
pub fn key(code: &str) -> Option<i32> {
    KEYS.iter()
        .find(|(name, _)| *name == code)
        .map(|&(_, value)| value)
}

static KEYS: &[(&str, i32)] = &[
    ("Space", 32),
    ("Quote", 39),
    ("Comma", 44),
    ("Minus", 45),
    ("Period", 46),
    ("Slash", 47),
    ("Digit0", 48),
    ("Digit1", 49),
    ("Digit2", 50),
    ("Digit3", 51),
    ("Digit4", 52),
    ("Digit5", 53),
    ("Digit6", 54),
    ("Digit7", 55),
    ("Digit8", 56),
    ("Digit9", 57),
    ("Semicolon", 59),
    ("Equal", 61),
    ("KeyA", 65),
    ("KeyB", 66),
    ("KeyC", 67),
    ("KeyD", 68),
    ("KeyE", 69),
    ("KeyF", 70),
    ("KeyG", 71),
    ("KeyH", 72),
    ("KeyI", 73),
    ("KeyJ", 74),
    ("KeyK", 75),
    ("KeyL", 76),
    ("KeyM", 77),
    ("KeyN", 78),
    ("KeyO", 79),
    ("KeyP", 80),
    ("KeyQ", 81),
    ("KeyR", 82),
    ("KeyS", 83),
    ("KeyT", 84),
    ("KeyU", 85),
    ("KeyV", 86),
    ("KeyW", 87),
    ("KeyX", 88),
    ("KeyY", 89),
    ("KeyZ", 90),
    ("BracketLeft", 91),
    ("Backslash", 92),
    ("BracketRight", 93),
    ("Backquote", 96),
    // GLFW_KEY_WORLD_1 (161) and GLFW_KEY_WORLD_2 (162) have no DOM code.
    ("Escape", 256),
    ("Enter", 257),
    ("Tab", 258),
    ("Backspace", 259),
    ("Insert", 260),
    ("Delete", 261),
    ("ArrowRight", 262),
    ("ArrowLeft", 263),
    ("ArrowDown", 264),
    ("ArrowUp", 265),
    ("PageUp", 266),
    ("PageDown", 267),
    ("Home", 268),
    ("End", 269),
    ("CapsLock", 280),
    ("ScrollLock", 281),
    ("NumLock", 282),
    ("PrintScreen", 283),
    ("Pause", 284),
    ("F1", 290),
    ("F2", 291),
    ("F3", 292),
    ("F4", 293),
    ("F5", 294),
    ("F6", 295),
    ("F7", 296),
    ("F8", 297),
    ("F9", 298),
    ("F10", 299),
    ("F11", 300),
    ("F12", 301),
    ("F13", 302),
    ("F14", 303),
    ("F15", 304),
    ("F16", 305),
    ("F17", 306),
    ("F18", 307),
    ("F19", 308),
    ("F20", 309),
    ("F21", 310),
    ("F22", 311),
    ("F23", 312),
    ("F24", 313),
    ("F25", 314),
    ("NumPad0", 320),
    ("NumPad1", 321),
    ("NumPad2", 322),
    ("NumPad3", 323),
    ("NumPad4", 324),
    ("NumPad5", 325),
    ("NumPad6", 326),
    ("NumPad7", 327),
    ("NumPad8", 328),
    ("NumPad9", 329),
    ("NumpadDecimal", 330),
    ("NumpadDivide", 331),
    ("NumpadMultiply", 332),
    ("NumpadSubtract", 333),
    ("NumpadAdd", 334),
    ("NumpadEnter", 335),
    ("NumpadEqual", 336),
    ("ShiftLeft", 340),
    ("ControlLeft", 341),
    ("AltLeft", 342),
    ("MetaLeft", 343),
    ("ShiftRight", 344),
    ("ControlRight", 345),
    ("AltRight", 346),
    ("MetaRight", 347),
    ("ContextMenu", 348),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_map_to_ascii() {
        assert_eq!(key("KeyA"), Some(b'A' as i32));
        assert_eq!(key("KeyZ"), Some(b'Z' as i32));
        assert_eq!(key("Digit7"), Some(b'7' as i32));
        assert_eq!(key("Space"), Some(b' ' as i32));
    }

    #[test]
    fn special_keys_start_at_256() {
        assert_eq!(key("Escape"), Some(256));
        assert_eq!(key("ArrowUp"), Some(265));
        assert_eq!(key("F25"), Some(314));
        assert_eq!(key("ContextMenu"), Some(348));
    }

    #[test]
    fn unknown_codes_are_dropped() {
        assert_eq!(key("IntlBackslash"), None);
        assert_eq!(key("keya"), None);
        assert_eq!(mouse_button(3), None);
    }

    #[test]
    fn mouse_right_and_middle_are_swapped() {
        assert_eq!(mouse_button(0), Some(0));
        assert_eq!(mouse_button(1), Some(2));
        assert_eq!(mouse_button(2), Some(1));
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let mut names: Vec<_> = KEYS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }
}
