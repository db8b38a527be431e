use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};

/// Keys that only change modifier state and never produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Modifier(ModifierKey),
    Other,
}

/// One keydown as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    /// A printable character; `shift` is inferred for upper-case letters
    /// and shifted symbols.
    pub fn char(c: char) -> Self {
        Self {
            shift: implies_shift(c),
            ..Self::new(Key::Char(c))
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            ctrl: true,
            ..Self::char(c)
        }
    }

    pub fn is_modifier_only(&self) -> bool {
        matches!(self.key, Key::Modifier(_))
    }
}

impl From<KeyEvent> for KeyInput {
    fn from(event: KeyEvent) -> Self {
        let key = match event.code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Escape,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Tab => Key::Tab,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::CapsLock => Key::Modifier(ModifierKey::CapsLock),
            KeyCode::Modifier(modifier) => Key::Modifier(match modifier {
                ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => ModifierKey::Shift,
                ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => {
                    ModifierKey::Control
                }
                ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => ModifierKey::Alt,
                _ => ModifierKey::Meta,
            }),
            _ => Key::Other,
        };

        let shifted = match key {
            Key::Char(c) => implies_shift(c),
            _ => false,
        };

        Self {
            key,
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            shift: event.modifiers.contains(KeyModifiers::SHIFT) || shifted,
            alt: event.modifiers.contains(KeyModifiers::ALT),
        }
    }
}

/// Terminals report `G` or `:` without the SHIFT flag on most layouts.
fn implies_shift(c: char) -> bool {
    c.is_ascii_uppercase() || "~!@#$%^&*()_+{}|:\"<>?".contains(c)
}
