use std::thread;
use std::time::Duration;

use device_query::{DeviceQuery, DeviceState, Keycode};
use global_hotkey::hotkey::{Code, Modifiers};
use tracing::debug;

use crate::KeyCombination;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Block until the user presses a key combination and return it.
///
/// This polls the keyboard until every key is released (so the click that
/// started the capture is not picked up), then until a non-modifier key goes
/// down, and reports that key together with the modifiers held at that
/// moment. There is no cancellation; the only way out is a key press. Must
/// run on a background thread, never on the UI thread.
pub fn capture_next_combination() -> KeyCombination {
    let device_state = DeviceState::new();

    while !device_state.get_keys().is_empty() {
        thread::sleep(POLL_INTERVAL);
    }

    loop {
        let keys = device_state.get_keys();

        let mut modifiers = Modifiers::empty();
        let mut primary = None;

        for key in keys {
            match map_keycode(key) {
                Some(MappedKey::Modifier(m)) => modifiers |= m,
                Some(MappedKey::Primary(code)) => {
                    primary.get_or_insert(code);
                }
                None => {}
            }
        }

        if let Some(code) = primary {
            let combination = KeyCombination::new(modifiers, code);
            debug!("captured combination '{combination}'");
            return combination;
        }

        thread::sleep(POLL_INTERVAL);
    }
}

enum MappedKey {
    Modifier(Modifiers),
    Primary(Code),
}

fn map_keycode(key: Keycode) -> Option<MappedKey> {
    use Keycode::*;

    let modifier = match key {
        LControl | RControl => Some(Modifiers::CONTROL),
        LShift | RShift => Some(Modifiers::SHIFT),
        LAlt | RAlt => Some(Modifiers::ALT),
        LMeta | RMeta => Some(Modifiers::META),
        _ => None,
    };
    if let Some(m) = modifier {
        return Some(MappedKey::Modifier(m));
    }

    let code = match key {
        A => Code::KeyA,
        B => Code::KeyB,
        C => Code::KeyC,
        D => Code::KeyD,
        E => Code::KeyE,
        F => Code::KeyF,
        G => Code::KeyG,
        H => Code::KeyH,
        I => Code::KeyI,
        J => Code::KeyJ,
        K => Code::KeyK,
        L => Code::KeyL,
        M => Code::KeyM,
        N => Code::KeyN,
        O => Code::KeyO,
        P => Code::KeyP,
        Q => Code::KeyQ,
        R => Code::KeyR,
        S => Code::KeyS,
        T => Code::KeyT,
        U => Code::KeyU,
        V => Code::KeyV,
        W => Code::KeyW,
        X => Code::KeyX,
        Y => Code::KeyY,
        Z => Code::KeyZ,
        Key0 => Code::Digit0,
        Key1 => Code::Digit1,
        Key2 => Code::Digit2,
        Key3 => Code::Digit3,
        Key4 => Code::Digit4,
        Key5 => Code::Digit5,
        Key6 => Code::Digit6,
        Key7 => Code::Digit7,
        Key8 => Code::Digit8,
        Key9 => Code::Digit9,
        F1 => Code::F1,
        F2 => Code::F2,
        F3 => Code::F3,
        F4 => Code::F4,
        F5 => Code::F5,
        F6 => Code::F6,
        F7 => Code::F7,
        F8 => Code::F8,
        F9 => Code::F9,
        F10 => Code::F10,
        F11 => Code::F11,
        F12 => Code::F12,
        Escape => Code::Escape,
        Space => Code::Space,
        Enter => Code::Enter,
        Backspace => Code::Backspace,
        Tab => Code::Tab,
        Up => Code::ArrowUp,
        Down => Code::ArrowDown,
        Left => Code::ArrowLeft,
        Right => Code::ArrowRight,
        Home => Code::Home,
        End => Code::End,
        PageUp => Code::PageUp,
        PageDown => Code::PageDown,
        Insert => Code::Insert,
        Delete => Code::Delete,
        CapsLock => Code::CapsLock,
        Grave => Code::Backquote,
        Minus => Code::Minus,
        Equal => Code::Equal,
        LeftBracket => Code::BracketLeft,
        RightBracket => Code::BracketRight,
        BackSlash => Code::Backslash,
        Semicolon => Code::Semicolon,
        Apostrophe => Code::Quote,
        Comma => Code::Comma,
        Dot => Code::Period,
        Slash => Code::Slash,
        _ => return None,
    };

    Some(MappedKey::Primary(code))
}
