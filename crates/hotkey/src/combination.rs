use std::fmt;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};

/// A global keyboard combination: zero or more modifiers plus one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombination {
    pub modifiers: Modifiers,
    pub code: Code,
}

impl KeyCombination {
    pub fn new(modifiers: Modifiers, code: Code) -> Self {
        Self { modifiers, code }
    }

    pub fn to_hotkey(self) -> HotKey {
        let mods = if self.modifiers.is_empty() {
            None
        } else {
            Some(self.modifiers)
        };
        HotKey::new(mods, self.code)
    }

    /// Identifier used by the OS-level registration; listener threads filter
    /// incoming events against this.
    pub fn id(self) -> u32 {
        self.to_hotkey().id()
    }

    /// True for combinations that would fire constantly during normal
    /// typing: a bare character, space, enter, or similar key with no
    /// modifier. Function keys and the menu key are fine unmodified.
    pub fn is_reserved(self) -> bool {
        self.modifiers.is_empty() && is_typing_key(self.code)
    }
}

impl Default for KeyCombination {
    /// The platform menu key, unmodified.
    fn default() -> Self {
        Self::new(Modifiers::empty(), Code::ContextMenu)
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::CONTROL) {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            write!(f, "shift+")?;
        }
        if self.modifiers.contains(Modifiers::ALT) {
            write!(f, "alt+")?;
        }
        if self.modifiers.contains(Modifiers::META) {
            write!(f, "super+")?;
        }
        write!(f, "{}", key_label(self.code))
    }
}

fn is_typing_key(code: Code) -> bool {
    use Code::*;
    if is_letter(code) || is_digit(code) {
        return true;
    }
    matches!(
        code,
        Space
            | Enter
            | Tab
            | Backspace
            | Minus
            | Equal
            | BracketLeft
            | BracketRight
            | Backslash
            | Semicolon
            | Quote
            | Backquote
            | Comma
            | Period
            | Slash
    )
}

fn is_letter(code: Code) -> bool {
    use Code::*;
    matches!(
        code,
        KeyA | KeyB
            | KeyC
            | KeyD
            | KeyE
            | KeyF
            | KeyG
            | KeyH
            | KeyI
            | KeyJ
            | KeyK
            | KeyL
            | KeyM
            | KeyN
            | KeyO
            | KeyP
            | KeyQ
            | KeyR
            | KeyS
            | KeyT
            | KeyU
            | KeyV
            | KeyW
            | KeyX
            | KeyY
            | KeyZ
    )
}

fn is_digit(code: Code) -> bool {
    use Code::*;
    matches!(
        code,
        Digit0 | Digit1 | Digit2 | Digit3 | Digit4 | Digit5 | Digit6 | Digit7 | Digit8 | Digit9
    )
}

fn key_label(code: Code) -> String {
    let name = format!("{code:?}");
    if let Some(letter) = name.strip_prefix("Key") {
        if letter.len() == 1 {
            return letter.to_ascii_lowercase();
        }
    }
    if let Some(digit) = name.strip_prefix("Digit") {
        if digit.len() == 1 {
            return digit.to_string();
        }
    }
    if let Some(arrow) = name.strip_prefix("Arrow") {
        return arrow.to_ascii_lowercase();
    }
    match code {
        Code::ContextMenu => "menu".to_string(),
        _ => name.to_ascii_lowercase(),
    }
}
