//! Overlays drawn on top of waveforms: playback cursor, threshold guide and
//! the overview's viewport mask. None of these are hot paths.

use image::Rgba;

use super::color::{BLACK, RED, WHITE};
use super::surface::{Composite, Surface};
use crate::audio::{PlayState, SampleBuffer, Viewport};

const PLAYED_TINT: Rgba<u8> = Rgba([0, 0, 200, 255]);
const PLAYED_TINT_OPACITY: f32 = 0.3;
const CURSOR_WIDTH: i64 = 2;
const CENTER_LINE_OPACITY: f32 = 0.1;
const MASK_OPACITY: f32 = 0.4;

/// Vertical cursor at `play_state.time`, scaled into the viewport's width.
///
/// Already played waveform pixels left of the cursor get a blue tint.
/// Does nothing while stopped.
pub fn draw_playback_cursor(
    target: &mut Surface,
    play_state: PlayState,
    buffer: &SampleBuffer,
    viewport: Viewport,
) {
    if !play_state.playing {
        return;
    }
    let span = viewport.duration(buffer);
    if !(span > 0.0) || !play_state.time.is_finite() {
        return;
    }

    let (width, height) = (i64::from(target.width()), i64::from(target.height()));
    // keep far off-screen positions small enough for the cursor arithmetic
    let x = (play_state.time / span * width as f64)
        .round()
        .clamp(-(width as f64), 2.0 * width as f64) as i64;

    target.fill_rect((0, 0), (x, height), PLAYED_TINT, PLAYED_TINT_OPACITY, Composite::SourceAtop);
    target.fill_rect(
        (x - CURSOR_WIDTH / 2, 0),
        (x + CURSOR_WIDTH / 2, height),
        WHITE,
        1.0,
        Composite::SourceOver,
    );
}

/// Opacity of the compression-zone shading for a ratio.
pub fn zone_opacity(ratio: f32) -> f32 {
    let opacity = ratio.ln() / 8.0;
    if opacity.is_nan() {
        return 0.0;
    }
    opacity.clamp(0.0, 1.0)
}

/// Mirrored threshold lines at `db` plus shading of the waveform by zone.
///
/// The band between the lines is tinted at [`zone_opacity`]; above and
/// below, a gradient ramps from clear at the edges to the zone tint and
/// then solid at the lines. Tinting only touches pixels that already have
/// coverage.
pub fn draw_threshold_line(target: &mut Surface, db: f32, ratio: f32) {
    let (width, height) = (i64::from(target.width()), i64::from(target.height()));
    if width == 0 || height == 0 {
        return;
    }

    let db = if db.is_nan() { 0.0 } else { db.min(0.0) };
    let amp = height as f32 / 2.0;
    let inset = amp * (1.0 - 10f32.powf(db / 20.0));
    let top = inset.round() as i64;
    let bottom = height - top;

    let mid = (height as f32 / 2.0).round() as i64;
    target.fill_rect((0, mid), (width, mid + 1), BLACK, CENTER_LINE_OPACITY, Composite::SourceOver);
    for row in [top, bottom.min(height - 1)] {
        target.fill_rect((0, row), (width, row + 1), RED, 1.0, Composite::SourceOver);
    }

    let zone = zone_opacity(ratio);
    target.fill_rect((0, top), (width, bottom), RED, zone, Composite::SourceAtop);

    if top <= 0 {
        return;
    }
    for offset in 0..top {
        let t = (offset as f32 + 0.5) / top as f32;
        let opacity = gradient(t, zone);
        let rows = [offset, height - 1 - offset];
        for row in rows {
            target.fill_rect((0, row), (width, row + 1), RED, opacity, Composite::SourceAtop);
        }
    }
}

/// Stops: clear at 0, zone tint at 0.99, opaque at 1.
fn gradient(t: f32, zone: f32) -> f32 {
    const KNEE: f32 = 0.99;
    if t <= KNEE {
        zone * t / KNEE
    } else {
        zone + (1.0 - zone) * (t - KNEE) / (1.0 - KNEE)
    }
}

/// Dim everything outside `[start_index, start_index + length)` on a
/// surface showing the whole buffer.
pub fn draw_viewport_mask(
    target: &mut Surface,
    buffer: &SampleBuffer,
    start_index: usize,
    length: usize,
) {
    let total = buffer.length();
    if total == 0 {
        return;
    }
    let (width, height) = (target.width() as f64, i64::from(target.height()));
    let x = (start_index as f64 / total as f64 * width).round().min(width);
    let w = (length as f64 / total as f64 * width).round();
    let end = (x + w).min(width);

    let (x, end) = (x as i64, end as i64);
    target.fill_rect((0, 0), (x, height), BLACK, MASK_OPACITY, Composite::SourceOver);
    target.fill_rect((end, 0), (width as i64, height), BLACK, MASK_OPACITY, Composite::SourceOver);
}
