//! Additive mixer with a single output gain stage.
//!
//! The mixer is plain data: it is owned by the playback controller behind
//! one mutex, which the output thread also takes for every render. That lock
//! is what keeps gain changes and device writes from interleaving.

use crate::protocol_constants::{VOLUME_BASE, VOLUME_DEFAULT, VOLUME_MAX, VOLUME_MIN};

/// One decoded sound queued in the mixer.
///
/// Samples are interleaved in the output channel layout and rate.
#[derive(Debug)]
pub struct Voice {
    asset_id: usize,
    samples: Vec<f32>,
    position: usize,
}

impl Voice {
    pub fn new(asset_id: usize, samples: Vec<f32>) -> Self {
        Self {
            asset_id,
            samples,
            position: 0,
        }
    }

    /// Catalog id of the asset this voice was decoded from.
    pub fn asset_id(&self) -> usize {
        self.asset_id
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.samples.len()
    }
}

/// Maps a volume level to a linear gain factor.
///
/// Anything at or below [`VOLUME_MIN`] is silent.
pub fn gain_for(volume: f64) -> f32 {
    if volume <= VOLUME_MIN {
        0.0
    } else {
        VOLUME_BASE.powf(volume) as f32
    }
}

/// Sums all active voices into the output buffer.
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    volume: f64,
    gain: f32,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            volume: VOLUME_DEFAULT,
            gain: gain_for(VOLUME_DEFAULT),
        }
    }

    pub fn add(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    /// Removes every voice, returning how many were active.
    pub fn clear(&mut self) -> usize {
        let count = self.voices.len();
        self.voices.clear();
        count
    }

    pub fn is_playing(&self) -> bool {
        !self.voices.is_empty()
    }

    /// Asset ids of the voices still in the mixer, oldest first.
    pub fn asset_ids(&self) -> Vec<usize> {
        self.voices.iter().map(Voice::asset_id).collect()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Sets the volume, clamped to `[VOLUME_MIN, VOLUME_MAX]`.
    ///
    /// Non-finite levels are ignored. Returns the level now in effect.
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        if volume.is_finite() {
            self.volume = volume.clamp(VOLUME_MIN, VOLUME_MAX);
            self.gain = gain_for(self.volume);
        }
        self.volume
    }

    /// Renders one buffer of interleaved output.
    ///
    /// Finished voices are dropped afterwards, so the mixer goes idle on its
    /// own once the last sound ends.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        for voice in &mut self.voices {
            let remaining = &voice.samples[voice.position..];
            let n = remaining.len().min(out.len());
            for (dst, src) in out.iter_mut().zip(&remaining[..n]) {
                *dst += *src;
            }
            voice.position += n;
        }
        self.voices.retain(|v| !v.is_finished());

        let gain = self.gain;
        for sample in out.iter_mut() {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_curve_is_exponential_base_two() {
        assert_eq!(gain_for(0.0), 1.0);
        assert_eq!(gain_for(-2.0), 0.25);
        assert_eq!(gain_for(1.0), 2.0);
        assert_eq!(gain_for(VOLUME_MIN), 0.0);
    }

    #[test]
    fn render_sums_voices_and_applies_gain() {
        let mut mixer = Mixer::new();
        mixer.set_volume(-1.0);
        mixer.add(Voice::new(0, vec![0.2, 0.2, 0.2, 0.2]));
        mixer.add(Voice::new(1, vec![0.4, 0.4]));

        let mut out = [0.0f32; 4];
        mixer.render(&mut out);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn finished_voices_leave_the_mixer() {
        let mut mixer = Mixer::new();
        mixer.add(Voice::new(3, vec![0.1; 6]));

        let mut out = [0.0f32; 4];
        mixer.render(&mut out);
        assert!(mixer.is_playing());
        mixer.render(&mut out);
        assert!(!mixer.is_playing());
        assert_eq!(out, [0.1, 0.1, 0.0, 0.0]);
    }

    #[test]
    fn output_is_clamped() {
        let mut mixer = Mixer::new();
        mixer.set_volume(VOLUME_MAX);
        mixer.add(Voice::new(0, vec![0.9, -0.9]));

        let mut out = [0.0f32; 2];
        mixer.render(&mut out);
        assert_eq!(out, [1.0, -1.0]);
    }

    #[test]
    fn set_volume_clamps_and_ignores_nan() {
        let mut mixer = Mixer::new();
        assert_eq!(mixer.set_volume(-2.0), -2.0);
        assert_eq!(mixer.set_volume(50.0), VOLUME_MAX);
        assert_eq!(mixer.set_volume(-50.0), VOLUME_MIN);
        assert_eq!(mixer.set_volume(f64::NAN), VOLUME_MIN);
    }

    #[test]
    fn clear_reports_removed_voices() {
        let mut mixer = Mixer::new();
        mixer.add(Voice::new(0, vec![0.1]));
        mixer.add(Voice::new(1, vec![0.1]));
        assert_eq!(mixer.clear(), 2);
        assert_eq!(mixer.clear(), 0);
        assert!(mixer.asset_ids().is_empty());
    }
}
