//! Integration tests for the compressor and the export path.


use fixtures::SAMPLE_RATE;
use squash_preview::audio::{
    compress, generate_constant, generate_sine, generate_tone_burst, generate_white_noise,
    render_compressed, CompressorParams, Envelope, ExportOptions, SampleBuffer, Viewport,
};

fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} (±{}), got {}",
        expected,
        tolerance,
        actual
    );
}

#[test]
fn test_quiet_signal_passes_unchanged() {
    fixtures::init_logging();
    let input = generate_sine(440.0, SAMPLE_RATE, 0.2, 0.05);
    let params = CompressorParams::new(-20.0, 8.0, 5.0, 50.0);
    let output = compress(&input, SAMPLE_RATE, &params);
    for (i, (a, b)) in input.iter().zip(&output).enumerate() {
        assert!((a - b).abs() < 1e-5, "sample {} changed: {} -> {}", i, a, b);
    }
}

#[test]
fn test_unity_ratio_is_identity() {
    let input = generate_white_noise(SAMPLE_RATE, 0.2, 1.0, 7);
    let params = CompressorParams::new(-40.0, 1.0, 1.0, 100.0);
    let output = compress(&input, SAMPLE_RATE, &params);
    for (a, b) in input.iter().zip(&output) {
        assert!((a.clamp(-1.0, 1.0) - b).abs() < 1e-5);
    }
}

#[test]
fn test_output_stays_in_range() {
    let input = generate_white_noise(SAMPLE_RATE, 0.5, 1.0, 42);
    for params in [
        CompressorParams::new(0.0, 1.0, 0.0, 0.0),
        CompressorParams::new(-60.0, 20.0, 0.0, 0.0),
        CompressorParams::new(-12.0, 2.0, 30.0, 500.0),
    ] {
        let output = compress(&input, SAMPLE_RATE, &params);
        assert!(output.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}

#[test]
fn test_constant_input_steady_state() {
    // -20 dBFS, 4:1 on a constant 0.5: 13.98 dB over, 10.48 dB reduction
    let params = CompressorParams::new(-20.0, 4.0, 0.0, 0.0);
    let output = compress(&generate_constant(0.5, 256), SAMPLE_RATE, &params);
    let expected_gain = 10f32.powf(-(13.979_4 * 0.75) / 20.0);
    assert_close(expected_gain, 0.299, 1e-3);
    for sample in &output {
        assert_close(*sample, 0.5 * expected_gain, 1e-4);
    }
}

#[test]
fn test_gain_converges_within_attack() {
    let params = CompressorParams::new(-20.0, 4.0, 10.0, 100.0);
    let mut envelope = Envelope::new(&params, SAMPLE_RATE);
    let target = params.target_gain(0.5);

    // five time constants get within 1% of the distance travelled
    let samples = (SAMPLE_RATE as f32 * 0.05) as usize;
    for _ in 0..samples {
        envelope.step(0.5);
    }
    assert_close(envelope.gain(), target, 0.01 * (1.0 - target));
}

#[test]
fn test_release_recovers_after_burst() {
    let input = generate_tone_burst(SAMPLE_RATE, 440.0, 0.05, 0.9, 0.2);
    let params = CompressorParams::new(-12.0, 6.0, 1.0, 20.0);
    let mut envelope = Envelope::new(&params, SAMPLE_RATE);

    let segment = input.len() / 3;
    let mut loud_min = 1.0f32;
    for (i, sample) in input.iter().enumerate() {
        let gain = envelope.step(*sample).gain;
        if i >= segment && i < 2 * segment {
            loud_min = loud_min.min(gain);
        }
    }
    assert!(loud_min < 0.5, "loud segment should be compressed, min gain {}", loud_min);
    // 200 ms of quiet is ten release constants
    assert_close(envelope.gain(), 1.0, 1e-3);
}

#[test]
fn test_out_of_domain_params_are_clamped() {
    let input = generate_constant(0.9, 64);
    let wild = CompressorParams::new(12.0, 0.25, -5.0, f32::NAN);
    assert_eq!(wild.sanitized(), CompressorParams::new(0.0, 1.0, 0.0, 0.0));
    let output = compress(&input, SAMPLE_RATE, &wild);
    assert!(output.iter().all(|s| (s - 0.9).abs() < 1e-5));
}

#[test]
fn test_export_clamps_viewport_and_keeps_channels() {
    let left = generate_constant(0.5, 1000);
    let right = generate_constant(-0.5, 1000);
    let source = SampleBuffer::new(vec![left, right], SAMPLE_RATE);
    let params = CompressorParams::new(-20.0, 4.0, 0.0, 0.0);

    let out = render_compressed(
        &source,
        Viewport::new(900, 500),
        &params,
        ExportOptions::default(),
    );
    assert_eq!(out.num_channels(), 2);
    assert_eq!(out.length(), 100);
    assert_eq!(out.sample_rate, SAMPLE_RATE);
    assert!(out.channels[0][0] > 0.0 && out.channels[1][0] < 0.0);
}

#[test]
fn test_export_normalize_reaches_full_scale() {
    let source = SampleBuffer::from_mono(generate_sine(100.0, SAMPLE_RATE, 0.1, 0.8), SAMPLE_RATE);
    let params = CompressorParams::new(-20.0, 4.0, 0.0, 50.0);
    let out = render_compressed(
        &source,
        Viewport::full(&source),
        &params,
        ExportOptions { normalize: true },
    );
    let peak = out.channels[0].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert_close(peak, 1.0, 1e-5);
}
