mod capture;
mod combination;
mod error;
mod listener;
mod manager;

pub use capture::capture_next_combination;
pub use combination::KeyCombination;
pub use error::HotkeyError;
pub use listener::{HotkeyEvent, spawn_listener};
pub use manager::HotkeyManager;

pub use global_hotkey::hotkey::{Code, Modifiers};
