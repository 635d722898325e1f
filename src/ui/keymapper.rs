//! Key mapping for terminal input
//!
//! Converts crossterm key events to the session's semantic key actions.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::session::KeyAction;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to actions
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent; `None` for keys the terminal ignores
    pub fn map(event: &KeyEvent) -> Option<KeyAction> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),

            KeyCode::Enter => Some(KeyAction::Submit),

            // Shift+Tab arrives as BackTab on most platforms
            KeyCode::Tab if !mods.contains(Modifiers::SHIFT) => Some(KeyAction::Complete),

            KeyCode::Backspace => Some(KeyAction::Backspace),
            KeyCode::Delete => Some(KeyAction::Delete),

            KeyCode::Left => Some(KeyAction::Left),
            KeyCode::Right => Some(KeyAction::Right),
            KeyCode::Home => Some(KeyAction::Home),
            KeyCode::End => Some(KeyAction::End),
            KeyCode::PageUp => Some(KeyAction::PageUp),
            KeyCode::PageDown => Some(KeyAction::PageDown),

            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Option<KeyAction> {
        if mods.contains(Modifiers::CTRL) {
            return match ch.to_ascii_lowercase() {
                'c' | 'd' => Some(KeyAction::Quit),
                'a' => Some(KeyAction::Home),
                'e' => Some(KeyAction::End),
                _ => None,
            };
        }
        if mods.contains(Modifiers::ALT) {
            return None;
        }
        Some(KeyAction::Insert(ch))
    }
}
