use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Decoded audio ready for playback: interleaved f32 samples.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Control messages consumed by the playback engine's audio callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    /// Pause and rewind to the start of the loaded file.
    Stop,
    SetVolume(f32),
}

/// Feedback emitted by the audio callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    /// Current playhead position in frames.
    Position(u64),
    /// The end of the loaded file was reached; playback halted.
    Finished,
}

/// Resample an audio buffer to a target sample rate.
///
/// Returns a clone if the buffer is already at the target rate or holds no
/// samples.
pub fn resample_audio(
    buffer: &AudioBuffer,
    target_sample_rate: u32,
) -> anyhow::Result<AudioBuffer> {
    if buffer.sample_rate == target_sample_rate || buffer.is_empty() {
        return Ok(buffer.clone());
    }

    let channels = buffer.channels as usize;
    let input_frames = buffer.frames();

    let resample_ratio = target_sample_rate as f64 / buffer.sample_rate as f64;
    let output_frames = (input_frames as f64 * resample_ratio).ceil() as usize;

    // Convert interleaved samples to per-channel format for rubato
    let mut input_channels = vec![Vec::with_capacity(input_frames); channels];
    for frame_idx in 0..input_frames {
        for ch in 0..channels {
            input_channels[ch].push(buffer.samples[frame_idx * channels + ch]);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler =
        SincFixedIn::<f32>::new(resample_ratio, 2.0, params, input_frames, channels)?;

    let output_channels = resampler.process(&input_channels, None)?;

    // Back to interleaved
    let mut output_samples = Vec::with_capacity(output_frames * channels);
    for frame_idx in 0..output_channels[0].len() {
        for ch in 0..channels {
            output_samples.push(output_channels[ch][frame_idx]);
        }
    }

    Ok(AudioBuffer {
        samples: output_samples,
        sample_rate: target_sample_rate,
        channels: buffer.channels,
    })
}
