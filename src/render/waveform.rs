//! Per-pixel waveform rasterization.
//!
//! [`draw_waveform`] is the hot path: one min/max bucket per pixel column,
//! shaped by the compressor envelope and written straight into the pixel
//! grid. [`draw_samples`] is a plain min/max trace for quick previews.

use image::Rgba;

use super::color::BLACK;
use super::surface::Surface;
use crate::audio::{CompressorParams, Envelope, SampleBuffer, Viewport};

/// Strip colour while the envelope is still pulling gain down.
pub const ATTACK_COLOR: Rgba<u8> = Rgba([255, 127, 100, 255]);
/// Strip colour while the signal sits above the threshold.
pub const COMPRESSING_COLOR: Rgba<u8> = Rgba([255, 255, 100, 255]);
/// Strip colour while gain recovers after the signal dropped below threshold.
pub const RELEASE_COLOR: Rgba<u8> = Rgba([100, 100, 255, 255]);

/// Rows at the bottom of each column used by the envelope indicator.
pub const INDICATOR_ROWS: u32 = 3;
const INDICATOR_COLUMNS: u32 = 2;

/// Envelope state shown under a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeIndicator {
    Attack,
    Compressing,
    Release,
}

impl EnvelopeIndicator {
    pub fn color(self) -> Rgba<u8> {
        match self {
            Self::Attack => ATTACK_COLOR,
            Self::Compressing => COMPRESSING_COLOR,
            Self::Release => RELEASE_COLOR,
        }
    }
}

/// Everything that shapes one compressed waveform render.
#[derive(Debug, Clone, Copy)]
pub struct WaveformRequest {
    pub viewport: Viewport,
    pub color: Rgba<u8>,
    pub params: CompressorParams,
}

/// Result of a waveform render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Complete,
    /// Stopped before drawing column `at`.
    Cancelled { at: u32 },
}

/// Render channel 0 of `buffer` into `target`.
///
/// `should_cancel` is consulted with the column index before each column;
/// returning `true` stops the render, leaving already drawn columns in place.
pub fn draw_waveform(
    target: &mut Surface,
    buffer: &SampleBuffer,
    request: &WaveformRequest,
    mut should_cancel: impl FnMut(u32) -> bool,
) -> RenderOutcome {
    let (width, height) = (target.width(), target.height());
    let data = match buffer.channel(0) {
        Some(data) if !data.is_empty() => data,
        _ => return RenderOutcome::Complete,
    };
    let viewport = request.viewport;
    if width == 0 || height == 0 || viewport.length == 0 {
        return RenderOutcome::Complete;
    }

    let step = viewport.length / width as usize;
    let amp = height as f32 / 2.0;
    let mut envelope = Envelope::new(&request.params, buffer.sample_rate);
    let release_ms = f64::from(envelope.params().release_ms);

    let start_ms = viewport.start_ms(buffer);
    let span_ms = viewport.duration(buffer) * 1000.0;
    let mut last_engaged_ms: Option<f64> = None;

    for x in 0..width {
        if should_cancel(x) {
            return RenderOutcome::Cancelled { at: x };
        }

        let now_ms = start_ms + f64::from(x) / f64::from(width) * span_ms;
        let (min, max) = column_extremes(data, viewport, step, x, width);

        let mut attacking = false;
        let mut compressing = false;
        let mut releasing = false;
        let mut shape = |sample: f32| {
            let env = envelope.step(sample.clamp(-1.0, 1.0));
            if env.compressing {
                last_engaged_ms = Some(now_ms);
            }
            compressing |= env.compressing;
            attacking |= env.attacking;
            releasing |= !env.compressing
                && last_engaged_ms.is_some_and(|engaged| now_ms - engaged < release_ms);
            sample * env.gain
        };
        let min = shape(min);
        let max = shape(max);

        let y1 = to_row(amp, min, height);
        let y2 = to_row(amp, max, height);
        target.vertical_span(x, y1, y2, request.color);

        let indicator = if attacking {
            Some(EnvelopeIndicator::Attack)
        } else if compressing {
            Some(EnvelopeIndicator::Compressing)
        } else if releasing {
            Some(EnvelopeIndicator::Release)
        } else {
            None
        };
        if let Some(indicator) = indicator {
            let color = indicator.color();
            for y in height.saturating_sub(INDICATOR_ROWS)..height {
                for dx in 0..INDICATOR_COLUMNS {
                    target.put_pixel(x + dx, y, color);
                }
            }
        }
    }

    RenderOutcome::Complete
}

/// Smallest and largest sample feeding column `x`.
///
/// Reads are clamped to the last valid index. When the viewport is narrower
/// than the surface (`step == 0`) each column shows the single sample under it.
fn column_extremes(
    data: &[f32],
    viewport: Viewport,
    step: usize,
    x: u32,
    width: u32,
) -> (f32, f32) {
    let last = data.len() - 1;
    let read = |offset: usize| data[viewport.start_index.saturating_add(offset).min(last)];

    if step == 0 {
        let sample = read(x as usize * viewport.length / width as usize);
        return (sample, sample);
    }

    // offsets at or past `in_range` all read the last sample
    let in_range = data.len().saturating_sub(viewport.start_index);
    let first = x as usize * step;
    let end = (first + step).min(in_range.max(first + 1));
    (first..end).map(read).fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s), hi.max(s))
    })
}

fn to_row(amp: f32, value: f32, height: u32) -> u32 {
    let y = (amp * (1.0 - value)).round();
    if y.is_nan() {
        return height / 2;
    }
    y.clamp(0.0, (height - 1) as f32) as u32
}

/// Simple min/max trace of `samples` across the first `max_width` columns.
///
/// Clears the whole surface first. Positive values are drawn upward.
pub fn draw_samples(target: &mut Surface, samples: &[f32], max_width: u32) {
    target.clear();
    let width = max_width.min(target.width());
    let height = target.height();
    if width == 0 || height == 0 || samples.is_empty() {
        return;
    }

    let mid = height as f32 / 2.0;
    let step = samples.len().div_ceil(width as usize);
    for (x, bucket) in samples.chunks(step).take(width as usize).enumerate() {
        let (min, max) = bucket
            .iter()
            .fold((1.0f32, -1.0f32), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        target.vertical_span(x as u32, to_row(mid, min, height), to_row(mid, max, height), BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn request(viewport: Viewport, params: CompressorParams) -> WaveformRequest {
        WaveformRequest {
            viewport,
            color: GREEN,
            params,
        }
    }

    #[test]
    fn test_column_extremes_clamps_reads() {
        let data = [0.1, -0.4, 0.7, 0.2];
        assert_eq!(column_extremes(&data, Viewport::new(0, 4), 2, 0, 2), (-0.4, 0.1));
        // second column reads past the end and sees the last sample only
        assert_eq!(column_extremes(&data, Viewport::new(3, 4), 2, 1, 2), (0.2, 0.2));
    }

    #[test]
    fn test_huge_viewport_scans_only_real_samples() {
        let data = [0.1, -0.4, 0.7, 0.2];
        let viewport = Viewport::new(1, 1 << 50);
        let step = viewport.length / 4;
        assert_eq!(column_extremes(&data, viewport, step, 0, 4), (-0.4, 0.7));
        assert_eq!(column_extremes(&data, viewport, step, 3, 4), (0.2, 0.2));
    }

    #[test]
    fn test_narrow_viewport_spreads_samples() {
        let data = [0.1, 0.2];
        assert_eq!(column_extremes(&data, Viewport::new(0, 2), 0, 0, 4), (0.1, 0.1));
        assert_eq!(column_extremes(&data, Viewport::new(0, 2), 0, 3, 4), (0.2, 0.2));
    }

    #[test]
    fn test_bypass_render_spans_full_scale() {
        let buffer = SampleBuffer::from_mono(vec![1.0, -1.0, 1.0, -1.0], 1000);
        let mut surface = Surface::new(2, 11);
        let outcome = draw_waveform(
            &mut surface,
            &buffer,
            &request(Viewport::full(&buffer), CompressorParams::bypass()),
            |_| false,
        );
        assert_eq!(outcome, RenderOutcome::Complete);
        assert_eq!(surface.pixel(0, 0), Some(GREEN));
        assert_eq!(surface.pixel(1, 5), Some(GREEN));
        // bottom rows carry no indicator when nothing is compressed
        assert_eq!(surface.pixel(0, 10), Some(GREEN));
    }

    #[test]
    fn test_compressing_columns_get_indicator() {
        let buffer = SampleBuffer::from_mono(vec![0.9; 64], 1000);
        let mut surface = Surface::new(8, 20);
        draw_waveform(
            &mut surface,
            &buffer,
            &request(Viewport::full(&buffer), CompressorParams::new(-20.0, 4.0, 0.0, 0.0)),
            |_| false,
        );
        // zero attack reaches the target immediately: steady compression
        assert_eq!(surface.pixel(3, 19), Some(COMPRESSING_COLOR));
        assert_eq!(surface.pixel(3, 17), Some(COMPRESSING_COLOR));
    }

    #[test]
    fn test_slow_attack_shows_attack_indicator() {
        let buffer = SampleBuffer::from_mono(vec![0.9; 64], 1000);
        let mut surface = Surface::new(8, 20);
        draw_waveform(
            &mut surface,
            &buffer,
            &request(Viewport::full(&buffer), CompressorParams::new(-20.0, 4.0, 500.0, 0.0)),
            |_| false,
        );
        assert_eq!(surface.pixel(0, 19), Some(ATTACK_COLOR));
    }

    #[test]
    fn test_cancel_stops_at_column() {
        let buffer = SampleBuffer::from_mono(vec![0.5; 100], 1000);
        let mut surface = Surface::new(10, 10);
        let outcome = draw_waveform(
            &mut surface,
            &buffer,
            &request(Viewport::full(&buffer), CompressorParams::bypass()),
            |x| x == 4,
        );
        assert_eq!(outcome, RenderOutcome::Cancelled { at: 4 });
        // 0.5 at amp 5 lands on row round(2.5) = 3
        assert_eq!(surface.pixel(3, 3), Some(GREEN));
        assert!((0..10).all(|y| surface.pixel(4, y) == Some(Rgba([0, 0, 0, 0]))));
    }

    #[test]
    fn test_draw_samples_limits_width() {
        let mut surface = Surface::new(10, 10);
        surface.put_pixel(9, 9, GREEN);
        draw_samples(&mut surface, &[0.5; 40], 4);
        assert_eq!(surface.pixel(0, 3), Some(BLACK));
        assert_eq!(surface.pixel(3, 3), Some(BLACK));
        assert!((0..10).all(|y| surface.pixel(5, y) == Some(Rgba([0, 0, 0, 0]))));
        // previous contents were cleared
        assert_eq!(surface.pixel(9, 9), Some(Rgba([0, 0, 0, 0])));
    }
}
