use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use global_hotkey::{GlobalHotKeyEvent, HotKeyState};
use tracing::debug;

/// Events posted from the listener thread into the UI's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    TogglePlayback,
}

/// Spawn the background thread that turns presses of the active combination
/// into [`HotkeyEvent`]s. The thread never touches UI state; it posts into
/// `events` and calls `wake` so the UI loop drains the queue on its next
/// pass. Runs until the receiving side is dropped.
pub fn spawn_listener(
    active_id: Arc<AtomicU32>,
    events: Sender<HotkeyEvent>,
    wake: impl Fn() + Send + 'static,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if !matches_active(event.id(), event.state(), active_id.load(Ordering::Relaxed)) {
                continue;
            }
            debug!("active hotkey pressed");
            if events.send(HotkeyEvent::TogglePlayback).is_err() {
                break;
            }
            wake();
        }
    })
}

/// A press of the currently bound combination; releases and stale bindings
/// are dropped.
fn matches_active(event_id: u32, state: HotKeyState, active_id: u32) -> bool {
    state == HotKeyState::Pressed && event_id == active_id
}
