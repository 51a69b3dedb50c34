//! Synthetic test signals.
//!
//! Deterministic material for exercising the compressor and the renderer:
//! steady tones, seeded noise, level steps and a transient-heavy kick loop.

use std::f32::consts::PI;

fn sample_count(sample_rate: u32, duration: f32) -> usize {
    (duration * sample_rate as f32).max(0.0) as usize
}

/// Sine wave at `amplitude` (0.0 to 1.0).
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate as f32;
    (0..sample_count(sample_rate, duration))
        .map(|i| amplitude * (step * i as f32).sin())
        .collect()
}

/// Seeded white noise in `[-amplitude, amplitude]`.
///
/// Uses a 64-bit LCG so the same seed always yields the same samples.
pub fn generate_white_noise(
    sample_rate: u32,
    duration: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    const MUL: u64 = 6364136223846793005;
    const INC: u64 = 1442695040888963407;

    let mut state = seed;
    (0..sample_count(sample_rate, duration))
        .map(|_| {
            state = state.wrapping_mul(MUL).wrapping_add(INC);
            // top 24 bits map exactly onto the f32 mantissa
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            amplitude * (unit * 2.0 - 1.0)
        })
        .collect()
}

/// Constant DC level, handy for steady-state gain checks.
pub fn generate_constant(level: f32, len: usize) -> Vec<f32> {
    vec![level; len]
}

/// Quiet tone, loud tone, quiet tone: one attack and one release transition.
pub fn generate_tone_burst(
    sample_rate: u32,
    frequency: f32,
    quiet: f32,
    loud: f32,
    segment_secs: f32,
) -> Vec<f32> {
    let segment = sample_count(sample_rate, segment_secs);
    let step = 2.0 * PI * frequency / sample_rate as f32;
    (0..segment * 3)
        .map(|i| {
            let amplitude = if (segment..segment * 2).contains(&i) {
                loud
            } else {
                quiet
            };
            amplitude * (step * i as f32).sin()
        })
        .collect()
}

/// Four-on-the-floor kick loop with decaying pitch, peak-limited to 1.0.
pub fn generate_kick_loop(bpm: f32, sample_rate: u32, duration: f32) -> Vec<f32> {
    let total = sample_count(sample_rate, duration);
    let beat = ((60.0 / bpm) * sample_rate as f32).max(1.0) as usize;
    let kick_len = sample_count(sample_rate, 0.15);

    let mut samples = vec![0.0f32; total];
    for onset in (0..total).step_by(beat) {
        for (i, sample) in samples[onset..].iter_mut().take(kick_len).enumerate() {
            let t = i as f32 / sample_rate as f32;
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            *sample += 0.9 * (-t * 15.0).exp() * (2.0 * PI * freq * t).sin();
        }
    }

    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 1.0 {
        samples.iter_mut().for_each(|s| *s /= peak);
    }
    samples
}
