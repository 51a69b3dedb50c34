//! Decoded audio buffers and the sample windows rendered from them.
//!
//! Decoding happens upstream; the engine only ever sees planar `f32`
//! channel data normalized to -1.0..1.0.

use serde::{Deserialize, Serialize};

/// Immutable multi-channel audio, one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Planar channel data (f32, normalized to -1.0..1.0)
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Single-channel buffer.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    /// Number of frames (samples per channel).
    ///
    /// Channels are expected to share a length; the shortest one wins so
    /// every frame index below `length()` is readable on every channel.
    pub fn length(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Duration of the audio in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.length() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

/// Half-open sample range `[start_index, start_index + length)` into a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub start_index: usize,
    pub length: usize,
}

impl Viewport {
    pub const fn new(start_index: usize, length: usize) -> Self {
        Self {
            start_index,
            length,
        }
    }

    /// Viewport spanning a whole buffer.
    pub fn full(buffer: &SampleBuffer) -> Self {
        Self::new(0, buffer.length())
    }

    pub const fn end(&self) -> usize {
        self.start_index.saturating_add(self.length)
    }

    /// Shrink the range so it lies within `len` samples.
    pub fn clamp_to(&self, len: usize) -> Self {
        let start = self.start_index.min(len);
        let end = self.end().min(len);
        Self::new(start, end - start)
    }

    /// Position of the viewport start in milliseconds.
    pub fn start_ms(&self, buffer: &SampleBuffer) -> f64 {
        let len = buffer.length();
        if len == 0 {
            return 0.0;
        }
        self.start_index as f64 / len as f64 * buffer.duration() * 1000.0
    }

    /// Time covered by the viewport in seconds.
    pub fn duration(&self, buffer: &SampleBuffer) -> f64 {
        let len = buffer.length();
        if len == 0 {
            return 0.0;
        }
        self.length as f64 / len as f64 * buffer.duration()
    }
}

/// Playback transport state reported by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayState {
    pub playing: bool,
    /// Seconds since playback of the viewport started.
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_duration() {
        let buffer = SampleBuffer::new(vec![vec![0.0; 44100], vec![0.0; 44100]], 44100);
        assert!((buffer.duration() - 1.0).abs() < 0.001);
        assert_eq!(buffer.length(), 44100);
        assert_eq!(buffer.num_channels(), 2);
    }

    #[test]
    fn test_zero_sample_rate_has_no_duration() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 10], 0);
        assert_eq!(buffer.duration(), 0.0);
    }

    #[test]
    fn test_viewport_clamp() {
        assert_eq!(Viewport::new(90, 20).clamp_to(100), Viewport::new(90, 10));
        assert_eq!(Viewport::new(150, 20).clamp_to(100), Viewport::new(100, 0));
        assert_eq!(Viewport::new(10, 20).clamp_to(100), Viewport::new(10, 20));
    }

    #[test]
    fn test_viewport_json_is_camel_case() {
        let viewport: Viewport =
            serde_json::from_str(r#"{"startIndex": 5, "length": 10}"#).unwrap();
        assert_eq!(viewport, Viewport::new(5, 10));
    }
}
