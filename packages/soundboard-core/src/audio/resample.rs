//! Conversion of decoded sounds to the output format.
//!
//! Sounds are short, so the whole clip is resampled in one pass with a
//! sinc resampler and then remapped to the output channel count.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::{DecodeError, DecodedSound};
use crate::protocol_constants::RESAMPLE_SINC_LEN;
use crate::state::OutputFormat;

/// Converts a decoded sound into interleaved samples in the output format.
pub fn prepare(sound: DecodedSound, format: &OutputFormat) -> Result<Vec<f32>, DecodeError> {
    let channels = sound.channels;
    let resampled = resample(sound, format.sample_rate)?;
    Ok(map_channels(&resampled.samples, channels, format.channels))
}

/// Resamples interleaved audio to `target_rate`.
///
/// Returns the input unchanged when the rates already match.
pub fn resample(sound: DecodedSound, target_rate: u32) -> Result<DecodedSound, DecodeError> {
    let channels = sound.channels as usize;
    let frames = sound.frames();
    if sound.sample_rate == target_rate || frames == 0 || channels == 0 {
        return Ok(DecodedSound {
            sample_rate: target_rate,
            ..sound
        });
    }
    if sound.sample_rate == 0 {
        return Err(DecodeError::Invalid("source sample rate is 0".into()));
    }

    let ratio = target_rate as f64 / sound.sample_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: RESAMPLE_SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut waves_in: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in sound.samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            waves_in[ch].push(sample);
        }
    }

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, frames, channels)
        .map_err(|e| DecodeError::Invalid(format!("resampler init failed: {}", e)))?;
    let delay = resampler.output_delay();

    let mut waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| DecodeError::Invalid(format!("resampling failed: {}", e)))?;
    // Flush the filter tail so the end of the clip is not cut off.
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| DecodeError::Invalid(format!("resampling failed: {}", e)))?;
    for (out, rest) in waves_out.iter_mut().zip(tail) {
        out.extend(rest);
    }

    let expected = (frames as f64 * ratio).ceil() as usize;
    let available = waves_out[0].len().saturating_sub(delay);
    let out_frames = expected.min(available);

    let mut samples = Vec::with_capacity(out_frames * channels);
    for i in delay..delay + out_frames {
        for wave in &waves_out {
            samples.push(wave[i]);
        }
    }

    Ok(DecodedSound {
        samples,
        sample_rate: target_rate,
        channels: sound.channels,
    })
}

/// Remaps interleaved audio from `from` to `to` channels.
///
/// Output channel `c` takes source channel `min(c, from - 1)`, so mono is
/// duplicated across all outputs and extra source channels are dropped.
pub fn map_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let from = from as usize;
    let to = to as usize;

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for c in 0..to {
            out.push(frame[c.min(from - 1)]);
        }
    }
    out
}
