//! Feed-forward dynamic range compressor.
//!
//! A one-pole envelope follower drives the gain toward the static
//! compression curve: attack smoothing while gain falls, release smoothing
//! while it recovers. The same [`Envelope`] powers the full per-sample
//! export path and the per-column approximation used for waveform drawing.

use serde::{Deserialize, Serialize};

/// User-facing compressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressorParams {
    /// Level in dBFS above which gain reduction starts.
    pub threshold_db: f32,
    /// Input:output slope above the threshold (4.0 means 4:1).
    pub ratio: f32,
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: 0.0,
            ratio: 2.0,
            attack_ms: 0.2,
            release_ms: 200.0,
        }
    }
}

impl CompressorParams {
    pub const fn new(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            attack_ms,
            release_ms,
        }
    }

    /// Settings that leave any signal untouched.
    pub const fn bypass() -> Self {
        Self::new(0.0, 1.0, 0.0, 0.0)
    }

    /// Clamp every field into its meaningful domain.
    ///
    /// Threshold is at most 0 dBFS, ratio at least 1, time constants
    /// non-negative. Non-finite values fall back to the bypass setting for
    /// that field.
    pub fn sanitized(&self) -> Self {
        let threshold_db = if self.threshold_db.is_nan() {
            0.0
        } else {
            // -inf would make every non-zero sample compress with infinite reduction
            self.threshold_db.clamp(f32::MIN, 0.0)
        };
        let ratio = if self.ratio.is_finite() {
            self.ratio.max(1.0)
        } else if self.ratio == f32::INFINITY {
            f32::MAX
        } else {
            1.0
        };
        Self {
            threshold_db,
            ratio,
            attack_ms: sanitize_time(self.attack_ms),
            release_ms: sanitize_time(self.release_ms),
        }
    }

    /// Linear amplitude of the threshold.
    pub fn threshold_linear(&self) -> f32 {
        10f32.powf(self.threshold_db / 20.0)
    }

    /// Static curve: gain applied to a sample of magnitude `abs` once the
    /// envelope has settled.
    pub fn target_gain(&self, abs: f32) -> f32 {
        if !(abs > self.threshold_linear()) {
            return 1.0;
        }
        let db_in = 20.0 * abs.log10();
        let over = db_in - self.threshold_db;
        let reduction = over - over / self.ratio;
        10f32.powf(-reduction / 20.0)
    }
}

fn sanitize_time(ms: f32) -> f32 {
    if ms.is_finite() {
        ms.max(0.0)
    } else {
        0.0
    }
}

/// Smoothing coefficient for a time constant.
///
/// A zero time constant gives 0: the envelope jumps straight to its target.
pub fn coefficient(time_ms: f32, sample_rate: u32) -> f32 {
    let samples = sample_rate as f32 * time_ms / 1000.0;
    if !(samples > 0.0) || !samples.is_finite() {
        return 0.0;
    }
    (-1.0 / samples).exp()
}

/// What the envelope did for one input value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeStep {
    /// Gain after smoothing, to be multiplied into the sample.
    pub gain: f32,
    /// Input exceeded the threshold.
    pub compressing: bool,
    /// Gain was still falling toward a lower target (attack phase).
    pub attacking: bool,
}

/// Gain state carried from one sample to the next.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: CompressorParams,
    threshold_linear: f32,
    attack_coef: f32,
    release_coef: f32,
    gain: f32,
}

impl Envelope {
    pub fn new(params: &CompressorParams, sample_rate: u32) -> Self {
        let params = params.sanitized();
        Self {
            threshold_linear: params.threshold_linear(),
            attack_coef: coefficient(params.attack_ms, sample_rate),
            release_coef: coefficient(params.release_ms, sample_rate),
            gain: 1.0,
            params,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }

    /// Advance the follower by one input value.
    pub fn step(&mut self, sample: f32) -> EnvelopeStep {
        let abs = sample.abs();
        // `abs > threshold` is false for 0 and NaN, so log10 never sees them
        let compressing = abs > self.threshold_linear;
        let target = if compressing {
            self.params.target_gain(abs)
        } else {
            1.0
        };

        let attacking = compressing && target < self.gain;
        let coef = if target < self.gain {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.gain = self.gain * coef + target * (1.0 - coef);
        if !self.gain.is_finite() {
            self.gain = 1.0;
        }

        EnvelopeStep {
            gain: self.gain,
            compressing,
            attacking,
        }
    }

    /// Compress one sample, clamped to [-1, 1].
    pub fn process(&mut self, sample: f32) -> f32 {
        let gain = self.step(sample).gain;
        clamp_output(sample * gain)
    }
}

/// Map a processed sample into [-1, 1], replacing non-finite values with 0.
pub fn clamp_output(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Compress a whole sample sequence with fresh envelope state.
///
/// # Example
///
/// ```
/// use squash_preview::audio::{compress, CompressorParams};
///
/// let input = vec![0.5f32; 64];
/// let output = compress(&input, 44100, &CompressorParams::new(-20.0, 4.0, 0.0, 0.0));
/// assert_eq!(output.len(), input.len());
/// assert!(output.iter().all(|s| *s < 0.5));
/// ```
pub fn compress(samples: &[f32], sample_rate: u32, params: &CompressorParams) -> Vec<f32> {
    let mut envelope = Envelope::new(params, sample_rate);
    samples.iter().map(|&s| envelope.process(s)).collect()
}
