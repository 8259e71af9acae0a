use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use global_hotkey::GlobalHotKeyManager;
use tracing::{info, warn};

use crate::{HotkeyError, KeyCombination};

/// Owns the OS-level hotkey registration and the identity of the one active
/// combination. Must live on the thread that created it (the UI thread);
/// listener threads observe the active id through a shared atomic.
pub struct HotkeyManager {
    inner: GlobalHotKeyManager,
    active: KeyCombination,
    active_id: Arc<AtomicU32>,
}

impl HotkeyManager {
    pub fn new(initial: KeyCombination) -> Result<Self, HotkeyError> {
        let inner = GlobalHotKeyManager::new()?;
        inner.register(initial.to_hotkey())?;
        info!("registered global hotkey '{initial}'");

        Ok(Self {
            inner,
            active: initial,
            active_id: Arc::new(AtomicU32::new(initial.id())),
        })
    }

    pub fn active(&self) -> KeyCombination {
        self.active
    }

    /// Handle for listener threads to filter events against the currently
    /// bound combination.
    pub fn active_id_handle(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.active_id)
    }

    /// Replace the active combination. The old binding is released before
    /// the new one is claimed; if claiming the new combination fails the old
    /// one is re-registered, so exactly one combination is bound on return.
    pub fn rebind(&mut self, next: KeyCombination) -> Result<(), HotkeyError> {
        if next.is_reserved() {
            return Err(HotkeyError::Reserved(next));
        }

        let old = self.active;
        self.inner.unregister(old.to_hotkey())?;

        match self.inner.register(next.to_hotkey()) {
            Ok(()) => {
                self.active = next;
                self.active_id.store(next.id(), Ordering::Relaxed);
                info!("rebound global hotkey '{old}' -> '{next}'");
                Ok(())
            }
            Err(err) => {
                warn!("could not register '{next}': {err}; keeping '{old}'");
                self.inner.register(old.to_hotkey())?;
                Err(err.into())
            }
        }
    }
}
