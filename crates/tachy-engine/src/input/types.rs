use std::fmt;
use std::str::FromStr;

use crate::coords::Vec2;
use crate::time::ClockSample;

/// Physical keyboard key.
///
/// Every physical key has its own identifier: left and right modifiers are
/// distinct, and so are keypad digits and their main-row counterparts. Keys
/// without a named variant keep a platform code so two such keys never share
/// a state slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MetaLeft,
    MetaRight,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Keypad
    Numpad0, Numpad1, Numpad2, Numpad3, Numpad4,
    Numpad5, Numpad6, Numpad7, Numpad8, Numpad9,
    NumpadEnter,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Key the platform identifies but that has no variant here. Carries the
    /// platform's key code.
    Unknown(u32),

    /// Key the platform could not identify. Carries the native scancode,
    /// or 0 when the platform reports none.
    Native(u32),
}

impl Key {
    /// Both shift keys.
    pub const SHIFT: [Key; 2] = [Key::ShiftLeft, Key::ShiftRight];
    /// Both control keys.
    pub const CONTROL: [Key; 2] = [Key::ControlLeft, Key::ControlRight];
    /// Both alt keys.
    pub const ALT: [Key; 2] = [Key::AltLeft, Key::AltRight];
    /// Both meta (super / command / windows) keys.
    pub const META: [Key; 2] = [Key::MetaLeft, Key::MetaRight];
}

const NAMED_KEYS: &[(&str, Key)] = &[
    ("escape", Key::Escape),
    ("enter", Key::Enter),
    ("return", Key::Enter),
    ("tab", Key::Tab),
    ("backspace", Key::Backspace),
    ("space", Key::Space),
    ("up", Key::ArrowUp),
    ("down", Key::ArrowDown),
    ("left", Key::ArrowLeft),
    ("right", Key::ArrowRight),
    ("left shift", Key::ShiftLeft),
    ("right shift", Key::ShiftRight),
    ("left ctrl", Key::ControlLeft),
    ("right ctrl", Key::ControlRight),
    ("left alt", Key::AltLeft),
    ("right alt", Key::AltRight),
    ("left meta", Key::MetaLeft),
    ("right meta", Key::MetaRight),
    ("[0]", Key::Numpad0),
    ("[1]", Key::Numpad1),
    ("[2]", Key::Numpad2),
    ("[3]", Key::Numpad3),
    ("[4]", Key::Numpad4),
    ("[5]", Key::Numpad5),
    ("[6]", Key::Numpad6),
    ("[7]", Key::Numpad7),
    ("[8]", Key::Numpad8),
    ("[9]", Key::Numpad9),
    ("keypad enter", Key::NumpadEnter),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
];

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
    Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
];

impl Key {
    /// Short lowercase name: `"a"`, `"7"`, `"[7]"` (keypad), `"left shift"`.
    pub fn name(self) -> String {
        if let Some(i) = LETTERS.iter().position(|k| *k == self) {
            return char::from(b'a' + i as u8).to_string();
        }
        if let Some(i) = DIGITS.iter().position(|k| *k == self) {
            return char::from(b'0' + i as u8).to_string();
        }
        if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, k)| *k == self) {
            return (*name).to_string();
        }
        match self {
            Key::Unknown(code) => format!("unknown({code})"),
            Key::Native(code) => format!("native({code})"),
            _ => format!("{self:?}").to_lowercase(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key name {0:?}")]
pub struct UnknownKeyName(pub String);

impl FromStr for Key {
    type Err = UnknownKeyName;

    /// Parses the names produced by `Key::name`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let bytes = lower.as_bytes();
        if bytes.len() == 1 {
            match bytes[0] {
                c @ b'a'..=b'z' => return Ok(LETTERS[usize::from(c - b'a')]),
                c @ b'0'..=b'9' => return Ok(DIGITS[usize::from(c - b'0')]),
                _ => {}
            }
        }
        NAMED_KEYS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, k)| *k)
            .ok_or_else(|| UnknownKeyName(s.to_string()))
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Kind of device an event came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Device {
    Key,
    MouseButton,
    MouseMove,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    Down,
    Up,
    Moved,
}

/// What an event is about.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputId {
    Key(Key),
    Button(MouseButton),
    Pointer,
}

/// One timestamped input transition. Immutable once recorded.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputEvent {
    pub id: InputId,
    pub transition: Transition,

    /// Clock sample taken when the event was drained.
    pub at: ClockSample,

    /// Pointer position in physical pixels, for mouse events.
    pub position: Option<Vec2>,

    /// OS auto-repeat of a held key.
    pub repeat: bool,
}

impl InputEvent {
    pub fn device(&self) -> Device {
        match self.id {
            InputId::Key(_) => Device::Key,
            InputId::Button(_) => Device::MouseButton,
            InputId::Pointer => Device::MouseMove,
        }
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        self.transition == Transition::Down
    }

    pub fn key(&self) -> Option<Key> {
        match self.id {
            InputId::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn button(&self) -> Option<MouseButton> {
        match self.id {
            InputId::Button(b) => Some(b),
            _ => None,
        }
    }
}

/// Untimed event as delivered by an `EventSource`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Key { key: Key, pressed: bool, repeat: bool },
    Button { button: MouseButton, pressed: bool },
    PointerMoved { x: f32, y: f32 },
    Focus(bool),
    CloseRequested,
}

impl RawInput {
    pub fn key_down(key: Key) -> Self {
        RawInput::Key {
            key,
            pressed: true,
            repeat: false,
        }
    }

    pub fn key_up(key: Key) -> Self {
        RawInput::Key {
            key,
            pressed: false,
            repeat: false,
        }
    }

    pub fn button_down(button: MouseButton) -> Self {
        RawInput::Button {
            button,
            pressed: true,
        }
    }

    pub fn button_up(button: MouseButton) -> Self {
        RawInput::Button {
            button,
            pressed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_parse_back() {
        for key in LETTERS.iter().chain(DIGITS.iter()).copied() {
            assert_eq!(key.name().parse::<Key>().unwrap(), key);
        }
        for (name, key) in NAMED_KEYS {
            assert_eq!(name.parse::<Key>().unwrap(), *key);
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("Escape".parse::<Key>().unwrap(), Key::Escape);
        assert_eq!(" A ".parse::<Key>().unwrap(), Key::A);
        assert_eq!(Key::Space.to_string(), "space");
    }

    #[test]
    fn sided_and_keypad_keys_have_their_own_names() {
        assert_eq!(Key::ShiftLeft.name(), "left shift");
        assert_eq!(Key::ShiftRight.name(), "right shift");
        assert_eq!(Key::Numpad7.name(), "[7]");
        assert_eq!(Key::Digit7.name(), "7");
        assert_eq!("[7]".parse::<Key>().unwrap(), Key::Numpad7);
        assert_ne!(Key::Unknown(5), Key::Native(5));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "hyper".parse::<Key>().unwrap_err();
        assert_eq!(err, UnknownKeyName("hyper".to_string()));
    }

    #[test]
    fn event_device_follows_id() {
        let ev = InputEvent {
            id: InputId::Button(MouseButton::Left),
            transition: Transition::Down,
            at: ClockSample::ZERO,
            position: Some(Vec2::new(1.0, 2.0)),
            repeat: false,
        };
        assert_eq!(ev.device(), Device::MouseButton);
        assert_eq!(ev.button(), Some(MouseButton::Left));
        assert_eq!(ev.key(), None);
    }
}
