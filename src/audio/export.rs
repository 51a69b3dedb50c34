//! Full-fidelity compression of a viewport for playback and file export.

use super::buffer::{SampleBuffer, Viewport};
use super::compressor::{compress, CompressorParams};

/// Post-processing applied to exported audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Scale the result so its loudest sample reaches full scale.
    pub normalize: bool,
}

/// Compress every channel of `source` inside `viewport`.
///
/// Runs the per-sample envelope (never the per-column approximation).
/// Each channel gets its own envelope state. A viewport reaching past the
/// buffer end is clamped.
pub fn render_compressed(
    source: &SampleBuffer,
    viewport: Viewport,
    params: &CompressorParams,
    options: ExportOptions,
) -> SampleBuffer {
    let range = viewport.clamp_to(source.length());
    let mut channels: Vec<Vec<f32>> = source
        .channels
        .iter()
        .map(|data| compress(&data[range.start_index..range.end()], source.sample_rate, params))
        .collect();

    if options.normalize {
        normalize_peak(&mut channels);
    }

    log::debug!(
        "rendered {} channel(s), {} frames from sample {}",
        channels.len(),
        range.length,
        range.start_index
    );

    SampleBuffer::new(channels, source.sample_rate)
}

/// Apply one shared makeup gain so the loudest sample across all channels is 1.0.
fn normalize_peak(channels: &mut [Vec<f32>]) {
    let peak = channels
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak <= f32::EPSILON {
        return;
    }
    let gain = 1.0 / peak;
    for sample in channels.iter_mut().flat_map(|c| c.iter_mut()) {
        *sample = (*sample * gain).clamp(-1.0, 1.0);
    }
}
