use basedrop::{Collector, Handle, Shared};
use cpal::{
    FromSample, SizedSample,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use playkey_transport::{AudioBuffer, Command, Status};

type SharedBuffer = Shared<AudioBuffer>;

struct RenderState {
    playing: bool,
    frame: usize,
    volume: f32,
    buffer: Option<SharedBuffer>,
}

pub struct AudioEngineHandle {
    pub commands: rtrb::Producer<Command>,
    pub status: rtrb::Consumer<Status>,
    pub buffers: rtrb::Producer<SharedBuffer>,
    pub collector: Collector,
    pub handle: Handle,
    sample_rate: u32,
    _stream: cpal::Stream,
}

impl AudioEngineHandle {
    /// Output rate of the device stream. Buffers handed to the engine must
    /// already be at this rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

pub fn start() -> anyhow::Result<AudioEngineHandle> {
    let collector = Collector::new();
    let handle = collector.handle();

    let (command_tx, command_rx) = rtrb::RingBuffer::<Command>::new(64);
    let (status_tx, status_rx) = rtrb::RingBuffer::<Status>::new(64);
    let (buffer_tx, buffer_rx) = rtrb::RingBuffer::<SharedBuffer>::new(4);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no output device found"))?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0;

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(
            &device,
            &config.into(),
            command_rx,
            buffer_rx,
            status_tx,
        )?,
        sample_format => anyhow::bail!("unsupported sample format '{sample_format}'"),
    };

    stream.play()?;

    Ok(AudioEngineHandle {
        commands: command_tx,
        status: status_rx,
        buffers: buffer_tx,
        collector,
        handle,
        sample_rate,
        _stream: stream,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut command_rx: rtrb::Consumer<Command>,
    mut buffer_rx: rtrb::Consumer<SharedBuffer>,
    mut status_tx: rtrb::Producer<Status>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let output_channels = config.channels as usize;

    let mut state = RenderState {
        playing: false,
        frame: 0,
        volume: 1.0,
        buffer: None,
    };

    let mut mixed = vec![0.0f32; output_channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            // Swap in a newly loaded file if available (lock-free); the old
            // Shared is reclaimed by the collector, never freed here.
            while let Ok(new_buffer) = buffer_rx.pop() {
                state.buffer = Some(new_buffer);
                state.frame = 0;
                state.playing = false;
            }

            while let Ok(cmd) = command_rx.pop() {
                match cmd {
                    Command::Play => state.playing = true,
                    Command::Pause => state.playing = false,
                    Command::Stop => {
                        state.playing = false;
                        state.frame = 0;
                    }
                    Command::SetVolume(volume) => state.volume = volume,
                }
            }

            let _ = status_tx.push(Status::Position(state.frame as u64));

            for frame in data.chunks_mut(output_channels) {
                let rendered = match (&state.buffer, state.playing) {
                    (Some(buffer), true) => {
                        mix_frame(buffer, state.frame, state.volume, &mut mixed)
                    }
                    _ => false,
                };

                if rendered {
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        *sample = T::from_sample(mixed[ch]);
                    }
                    state.frame += 1;
                } else {
                    if state.playing {
                        // Ran past the end of the file; rewind so the next
                        // play starts over
                        state.playing = false;
                        state.frame = 0;
                        let _ = status_tx.push(Status::Finished);
                    }
                    for sample in frame.iter_mut() {
                        *sample = T::from_sample(0.0);
                    }
                }
            }
        },
        |err| eprintln!("stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// Fill `out` with one frame of `buffer` at `frame_idx`, scaled by `volume`.
/// Buffer channels wrap across the output channels (mono plays on both sides
/// of a stereo device). Returns false past the end of the buffer.
fn mix_frame(buffer: &AudioBuffer, frame_idx: usize, volume: f32, out: &mut [f32]) -> bool {
    if frame_idx >= buffer.frames() {
        return false;
    }

    let buffer_channels = buffer.channels as usize;
    for (ch, sample) in out.iter_mut().enumerate() {
        let idx = frame_idx * buffer_channels + ch % buffer_channels;
        *sample = buffer.samples[idx] * volume;
    }
    true
}
