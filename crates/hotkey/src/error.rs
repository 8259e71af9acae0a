use crate::KeyCombination;

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey registration failed: {0}")]
    Backend(#[from] global_hotkey::Error),

    #[error("'{0}' is used for regular typing and cannot be a global hotkey")]
    Reserved(KeyCombination),
}
