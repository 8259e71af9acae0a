use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui;
use playkey_core::{AudioEngineHandle, PlaybackState, Session};
use playkey_hotkey::{
    HotkeyEvent, HotkeyManager, KeyCombination, capture_next_combination, spawn_listener,
};
use tracing::warn;

use crate::text::{format_time, truncate_label};

const FILE_LABEL_MAX: usize = 25;

pub struct PlaykeyApp {
    session: Session<AudioEngineHandle>,
    manager: HotkeyManager,
    hotkey_events: Receiver<HotkeyEvent>,
    capture_result: Option<Receiver<KeyCombination>>,
    status_line: String,
}

impl PlaykeyApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let engine = playkey_engine::start()?;
        let session = Session::new(engine);

        let manager = HotkeyManager::new(KeyCombination::default())?;

        let (events_tx, events_rx) = mpsc::channel();
        let repaint = cc.egui_ctx.clone();
        spawn_listener(manager.active_id_handle(), events_tx, move || {
            repaint.request_repaint()
        });

        Ok(Self {
            session,
            manager,
            hotkey_events: events_rx,
            capture_result: None,
            status_line: "Ready. Select an audio file to begin.".to_string(),
        })
    }

    fn file_label(&self) -> String {
        match self.session.file() {
            Some(file) => {
                let name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                truncate_label(&name, FILE_LABEL_MAX)
            }
            None => "No file selected".to_string(),
        }
    }

    fn browse_for_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Audio Files", playkey_core::SUPPORTED_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file()
        else {
            return;
        };
        self.load_file(path);
    }

    fn load_file(&mut self, path: PathBuf) {
        match self.session.select_file(path) {
            Ok(()) => {
                self.status_line = format!("Loaded: {}", self.file_label());
            }
            Err(err) => {
                warn!("{err}");
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Error)
                    .set_title("Error")
                    .set_description(err.to_string())
                    .show();
                self.status_line = "Could not load audio file!".to_string();
            }
        }
    }

    fn toggle_playback(&mut self) {
        match self.session.toggle_playback() {
            Ok(PlaybackState::Playing) => self.status_line = "Playing...".to_string(),
            Ok(_) => self.status_line = "Paused".to_string(),
            Err(err) => self.status_line = err.to_string(),
        }
    }

    fn begin_rebind(&mut self, ctx: &egui::Context) {
        if let Err(err) = self.session.begin_rebind() {
            self.status_line = err.to_string();
            return;
        }
        self.status_line = "Press a new hotkey combination...".to_string();

        // The capture blocks until a key is pressed; it must never run on
        // the UI thread.
        let (result_tx, result_rx) = mpsc::channel();
        let repaint = ctx.clone();
        thread::spawn(move || {
            let combination = capture_next_combination();
            let _ = result_tx.send(combination);
            repaint.request_repaint();
        });
        self.capture_result = Some(result_rx);
    }

    fn poll_capture(&mut self) {
        let Some(result_rx) = &self.capture_result else {
            return;
        };
        match result_rx.try_recv() {
            Ok(captured) => {
                self.capture_result = None;
                match self.manager.rebind(captured) {
                    Ok(()) => {
                        self.session.finish_rebind(captured);
                        self.status_line = format!("Hotkey changed to: {captured}");
                    }
                    Err(err) => {
                        warn!("hotkey rebind failed: {err}");
                        self.session.cancel_rebind();
                        self.status_line = format!("Hotkey unchanged: {err}");
                    }
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.capture_result = None;
                self.session.cancel_rebind();
                self.status_line = "Hotkey capture failed".to_string();
            }
        }
    }
}

impl eframe::App for PlaykeyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Events posted by background threads, applied on the UI thread
        while let Ok(event) = self.hotkey_events.try_recv() {
            match event {
                HotkeyEvent::TogglePlayback => self.toggle_playback(),
            }
        }
        self.poll_capture();
        self.session.poll_status();

        if self.session.is_playing() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Playkey");
            ui.add_space(4.0);

            ui.group(|ui| {
                ui.label("Audio File");
                ui.horizontal(|ui| {
                    ui.label(self.file_label());
                    if ui.button("Browse").clicked() {
                        self.browse_for_file();
                    }
                });
            });

            ui.group(|ui| {
                ui.label("Playback");
                ui.horizontal(|ui| {
                    let toggle_text = if self.session.is_playing() {
                        "⏸ Pause"
                    } else {
                        "▶ Play"
                    };
                    if ui.button(toggle_text).clicked() {
                        self.toggle_playback();
                    }
                    if ui.button("⏹ Stop").clicked() {
                        self.session.stop_playback();
                        self.status_line = "Playback stopped".to_string();
                    }
                    if let Some(file) = self.session.file() {
                        ui.label(format!(
                            "{} / {}",
                            format_time(self.session.position_secs()),
                            format_time(file.duration_secs)
                        ));
                    }
                });
            });

            ui.group(|ui| {
                ui.label("Volume");
                let mut volume = self.session.volume();
                if ui
                    .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                    .changed()
                {
                    self.session.set_volume(volume);
                }
            });

            ui.group(|ui| {
                ui.label("Hotkey");
                ui.horizontal(|ui| {
                    ui.label(format!("Current: {}", self.session.hotkey()));
                    let rebinding = self.session.rebind_pending();
                    if ui
                        .add_enabled(!rebinding, egui::Button::new("Change Hotkey"))
                        .clicked()
                    {
                        self.begin_rebind(ctx);
                    }
                });
            });

            ui.separator();
            ui.label(&self.status_line);
        });
    }
}
