pub mod session;

pub use session::{
    DEFAULT_VOLUME, LoadedFile, PlaybackControl, PlaybackState, Session, SessionError,
};

pub use playkey_decode::{SUPPORTED_EXTENSIONS, decode_file};
pub use playkey_engine::AudioEngineHandle;
pub use playkey_hotkey::KeyCombination;
pub use playkey_transport::{AudioBuffer, Command, Status};
