use std::path::PathBuf;

use basedrop::Shared;
use playkey_decode::decode_file;
use playkey_engine::AudioEngineHandle;
use playkey_hotkey::KeyCombination;
use playkey_transport::{AudioBuffer, Command, Status, resample_audio};
use tracing::{debug, info};

pub const DEFAULT_VOLUME: f32 = 0.75;

/// The playback engine as the session sees it. The cpal-backed
/// [`AudioEngineHandle`] is the production implementation; tests substitute
/// a recording fake to observe the exact call sequence.
pub trait PlaybackControl {
    /// Output rate buffers must be resampled to before [`load`](Self::load).
    fn sample_rate(&self) -> u32;
    fn load(&mut self, buffer: AudioBuffer);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn poll(&mut self) -> Vec<Status>;
}

impl PlaybackControl for AudioEngineHandle {
    fn sample_rate(&self) -> u32 {
        AudioEngineHandle::sample_rate(self)
    }

    fn load(&mut self, buffer: AudioBuffer) {
        let shared = Shared::new(&self.handle, buffer);
        let _ = self.buffers.push(shared);
    }

    fn play(&mut self) {
        let _ = self.commands.push(Command::Play);
    }

    fn pause(&mut self) {
        let _ = self.commands.push(Command::Pause);
    }

    fn stop(&mut self) {
        let _ = self.commands.push(Command::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        let _ = self.commands.push(Command::SetVolume(volume));
    }

    fn poll(&mut self) -> Vec<Status> {
        let mut statuses = Vec::new();
        while let Ok(status) = self.status.pop() {
            statuses.push(status);
        }
        // Reclaim buffers the audio callback has released
        self.collector.collect();
        statuses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No file loaded.
    Idle,
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not load audio file '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("no audio file selected")]
    NothingLoaded,

    #[error("a hotkey rebind is already in progress")]
    RebindPending,
}

/// The single mutable record of the running application: loaded file,
/// playback state, volume, and the bound hotkey. All mutation happens on
/// the UI thread; the hotkey listener reaches it only through the event
/// queue the UI drains.
pub struct Session<P: PlaybackControl> {
    engine: P,
    file: Option<LoadedFile>,
    playback: PlaybackState,
    volume: f32,
    position_secs: f64,
    hotkey: KeyCombination,
    rebind_pending: bool,
}

impl<P: PlaybackControl> Session<P> {
    pub fn new(mut engine: P) -> Self {
        engine.set_volume(DEFAULT_VOLUME);
        Self {
            engine,
            file: None,
            playback: PlaybackState::Idle,
            volume: DEFAULT_VOLUME,
            position_secs: 0.0,
            hotkey: KeyCombination::default(),
            rebind_pending: false,
        }
    }

    /// Load a new file, replacing the current one. Playback is reset to
    /// paused at the start of the file. On failure nothing changes; the
    /// previously loaded file, if any, stays loaded.
    pub fn select_file(&mut self, path: PathBuf) -> Result<(), SessionError> {
        let decoded = decode_file(&path).map_err(|source| SessionError::Decode {
            path: path.clone(),
            source,
        })?;

        let buffer = resample_audio(&decoded, self.engine.sample_rate()).map_err(|source| {
            SessionError::Decode {
                path: path.clone(),
                source,
            }
        })?;

        let duration_secs = buffer.duration_secs();
        self.engine.load(buffer);

        info!(file = %path.display(), duration_secs, "loaded audio file");
        self.file = Some(LoadedFile {
            path,
            duration_secs,
        });
        self.playback = PlaybackState::Paused;
        self.position_secs = 0.0;
        Ok(())
    }

    /// Flip between playing and paused. With no file loaded this is a
    /// rejected no-op and the engine is not touched.
    pub fn toggle_playback(&mut self) -> Result<PlaybackState, SessionError> {
        if self.file.is_none() {
            return Err(SessionError::NothingLoaded);
        }

        match self.playback {
            PlaybackState::Playing => {
                self.engine.pause();
                self.playback = PlaybackState::Paused;
            }
            _ => {
                self.engine.play();
                self.playback = PlaybackState::Playing;
            }
        }
        debug!(state = ?self.playback, "toggled playback");
        Ok(self.playback)
    }

    /// Pause and rewind to the start of the file.
    pub fn stop_playback(&mut self) {
        if self.file.is_none() {
            return;
        }
        self.engine.stop();
        self.playback = PlaybackState::Paused;
        self.position_secs = 0.0;
    }

    /// Clamp to [0, 1] and forward to the engine. Non-finite values are
    /// dropped without comment; sliders produce noise, not errors.
    pub fn set_volume(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        let clamped = value.clamp(0.0, 1.0);
        self.engine.set_volume(clamped);
        self.volume = clamped;
    }

    /// Claim the single rebind slot. A second request while a capture is in
    /// flight is rejected, not queued.
    pub fn begin_rebind(&mut self) -> Result<(), SessionError> {
        if self.rebind_pending {
            return Err(SessionError::RebindPending);
        }
        self.rebind_pending = true;
        Ok(())
    }

    /// Record the newly bound combination after the manager accepted it.
    pub fn finish_rebind(&mut self, bound: KeyCombination) {
        info!(hotkey = %bound, "hotkey rebound");
        self.hotkey = bound;
        self.rebind_pending = false;
    }

    /// Release the rebind slot without changing the binding (capture failed
    /// or the new combination was rejected).
    pub fn cancel_rebind(&mut self) {
        self.rebind_pending = false;
    }

    /// Drain engine feedback. Playhead positions update the displayed time;
    /// end-of-file rewinds and returns to paused.
    pub fn poll_status(&mut self) {
        let sample_rate = self.engine.sample_rate();
        for status in self.engine.poll() {
            if self.file.is_none() {
                continue;
            }
            match status {
                Status::Position(frames) => {
                    self.position_secs = frames as f64 / sample_rate as f64;
                }
                Status::Finished => {
                    debug!("playback reached end of file");
                    self.playback = PlaybackState::Paused;
                    self.position_secs = 0.0;
                }
            }
        }
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn hotkey(&self) -> KeyCombination {
        self.hotkey
    }

    pub fn rebind_pending(&self) -> bool {
        self.rebind_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playkey_hotkey::{Code, Modifiers};
    use std::cell::RefCell;
    use std::f32::consts::PI;
    use std::io::Write;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum EngineCall {
        Load,
        Play,
        Pause,
        Stop,
        SetVolume(f32),
    }

    /// Fake engine recording every call for sequence assertions.
    #[derive(Default)]
    struct RecordingEngine {
        calls: Rc<RefCell<Vec<EngineCall>>>,
        pending_status: Rc<RefCell<Vec<Status>>>,
    }

    impl PlaybackControl for RecordingEngine {
        fn sample_rate(&self) -> u32 {
            44100
        }

        fn load(&mut self, _buffer: AudioBuffer) {
            self.calls.borrow_mut().push(EngineCall::Load);
        }

        fn play(&mut self) {
            self.calls.borrow_mut().push(EngineCall::Play);
        }

        fn pause(&mut self) {
            self.calls.borrow_mut().push(EngineCall::Pause);
        }

        fn stop(&mut self) {
            self.calls.borrow_mut().push(EngineCall::Stop);
        }

        fn set_volume(&mut self, volume: f32) {
            self.calls.borrow_mut().push(EngineCall::SetVolume(volume));
        }

        fn poll(&mut self) -> Vec<Status> {
            self.pending_status.borrow_mut().drain(..).collect()
        }
    }

    type Calls = Rc<RefCell<Vec<EngineCall>>>;
    type Pending = Rc<RefCell<Vec<Status>>>;

    fn new_session() -> (Session<RecordingEngine>, Calls, Pending) {
        let engine = RecordingEngine::default();
        let calls = Rc::clone(&engine.calls);
        let pending = Rc::clone(&engine.pending_status);
        let session = Session::new(engine);
        // Drop the initial volume sync; tests assert on what follows
        calls.borrow_mut().clear();
        (session, calls, pending)
    }

    fn write_tone_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for i in 0..4410 {
            let t = i as f32 / 44100.0;
            let sample = ((2.0 * PI * 440.0 * t).sin() * 0.5 * i16::MAX as f32) as i16;
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    fn write_garbage(path: &Path) {
        let mut file = std::fs::File::create(path).expect("create");
        file.write_all(b"definitely not audio").expect("write");
    }

    #[test]
    fn test_fresh_session_defaults() {
        let (session, _, _) = new_session();

        assert_eq!(session.volume(), 0.75);
        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert!(!session.is_playing());
        assert!(session.file().is_none());
        assert_eq!(session.hotkey(), KeyCombination::default());
        assert!(!session.rebind_pending());
    }

    #[test]
    fn test_new_session_syncs_default_volume_to_engine() {
        let engine = RecordingEngine::default();
        let calls = Rc::clone(&engine.calls);
        let _session = Session::new(engine);

        assert_eq!(*calls.borrow(), vec![EngineCall::SetVolume(0.75)]);
    }

    #[test]
    fn test_toggle_with_no_file_is_rejected_without_engine_calls() {
        let (mut session, calls, _) = new_session();

        let result = session.toggle_playback();

        assert!(matches!(result, Err(SessionError::NothingLoaded)));
        assert!(!session.is_playing());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_select_file_loads_paused_at_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path);

        let (mut session, calls, _) = new_session();
        session.select_file(path.clone()).expect("select");

        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.file().unwrap().path, path);
        assert!(session.file().unwrap().duration_secs > 0.0);
        assert_eq!(session.position_secs(), 0.0);
        assert_eq!(*calls.borrow(), vec![EngineCall::Load]);
    }

    #[test]
    fn test_select_toggle_toggle_sends_one_play_one_pause() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path);

        let (mut session, calls, _) = new_session();
        session.select_file(path).expect("select");

        assert_eq!(
            session.toggle_playback().expect("toggle"),
            PlaybackState::Playing
        );
        assert_eq!(
            session.toggle_playback().expect("toggle"),
            PlaybackState::Paused
        );
        assert!(!session.is_playing());

        let transport_calls: Vec<EngineCall> = calls
            .borrow()
            .iter()
            .copied()
            .filter(|c| matches!(c, EngineCall::Play | EngineCall::Pause))
            .collect();
        assert_eq!(transport_calls, vec![EngineCall::Play, EngineCall::Pause]);
    }

    #[test]
    fn test_select_invalid_leaves_prior_state_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("tone.wav");
        let bad = dir.path().join("garbage.mp3");
        write_tone_wav(&good);
        write_garbage(&bad);

        let (mut session, calls, _) = new_session();
        session.select_file(good.clone()).expect("select");
        session.toggle_playback().expect("toggle");
        let calls_before = calls.borrow().len();

        let result = session.select_file(bad);

        assert!(matches!(result, Err(SessionError::Decode { .. })));
        assert_eq!(session.file().unwrap().path, good);
        assert!(session.is_playing());
        assert_eq!(calls.borrow().len(), calls_before);
    }

    #[test]
    fn test_select_while_playing_resets_to_paused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first.wav");
        let second = dir.path().join("second.wav");
        write_tone_wav(&first);
        write_tone_wav(&second);

        let (mut session, _, _) = new_session();
        session.select_file(first).expect("select");
        session.toggle_playback().expect("toggle");
        assert!(session.is_playing());

        session.select_file(second.clone()).expect("select");

        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.file().unwrap().path, second);
    }

    #[test]
    fn test_volume_is_clamped() {
        let (mut session, calls, _) = new_session();

        session.set_volume(0.5);
        assert_eq!(session.volume(), 0.5);

        session.set_volume(1.7);
        assert_eq!(session.volume(), 1.0);

        session.set_volume(-0.3);
        assert_eq!(session.volume(), 0.0);

        assert_eq!(
            *calls.borrow(),
            vec![
                EngineCall::SetVolume(0.5),
                EngineCall::SetVolume(1.0),
                EngineCall::SetVolume(0.0),
            ]
        );
    }

    #[test]
    fn test_non_finite_volume_is_ignored() {
        let (mut session, calls, _) = new_session();
        session.set_volume(0.5);
        calls.borrow_mut().clear();

        session.set_volume(f32::NAN);
        session.set_volume(f32::INFINITY);
        session.set_volume(f32::NEG_INFINITY);

        assert_eq!(session.volume(), 0.5);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_stop_rewinds_and_pauses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path);

        let (mut session, calls, pending) = new_session();
        session.select_file(path).expect("select");
        session.toggle_playback().expect("toggle");

        pending.borrow_mut().push(Status::Position(22050));
        session.poll_status();
        assert_eq!(session.position_secs(), 0.5);

        session.stop_playback();

        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.position_secs(), 0.0);
        assert!(calls.borrow().contains(&EngineCall::Stop));
    }

    #[test]
    fn test_stop_with_no_file_is_a_noop() {
        let (mut session, calls, _) = new_session();

        session.stop_playback();

        assert_eq!(session.playback_state(), PlaybackState::Idle);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_end_of_file_returns_to_paused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tone.wav");
        write_tone_wav(&path);

        let (mut session, _, pending) = new_session();
        session.select_file(path).expect("select");
        session.toggle_playback().expect("toggle");
        assert!(session.is_playing());

        pending.borrow_mut().push(Status::Finished);
        session.poll_status();

        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.position_secs(), 0.0);
    }

    #[test]
    fn test_concurrent_rebind_is_rejected() {
        let (mut session, _, _) = new_session();

        session.begin_rebind().expect("begin");
        assert!(session.rebind_pending());
        assert!(matches!(
            session.begin_rebind(),
            Err(SessionError::RebindPending)
        ));
    }

    #[test]
    fn test_finish_rebind_swaps_combination() {
        let (mut session, _, _) = new_session();
        let next = KeyCombination::new(Modifiers::CONTROL, Code::KeyP);

        session.begin_rebind().expect("begin");
        session.finish_rebind(next);

        assert_eq!(session.hotkey(), next);
        assert!(!session.rebind_pending());
    }

    #[test]
    fn test_cancel_rebind_keeps_old_combination() {
        let (mut session, _, _) = new_session();
        let old = session.hotkey();

        session.begin_rebind().expect("begin");
        session.cancel_rebind();

        assert_eq!(session.hotkey(), old);
        assert!(!session.rebind_pending());
        session.begin_rebind().expect("slot released");
    }
}
