//! CPU rasterization into named surfaces.
//!
//! This module provides:
//! - RGBA surfaces with direct pixel writes and alpha compositing
//! - The compressed waveform renderer and a plain sample trace
//! - Cursor, threshold and viewport overlays
//! - The bulk-evicting bitmap cache and its per-label statistics

pub mod cache;
pub mod color;
pub mod guides;
pub mod surface;
pub mod waveform;

pub use cache::{CacheKey, CacheStats, CacheStatsTable, RenderCache, DEFAULT_CAPACITY};
pub use color::parse_hex_color;
pub use guides::{draw_playback_cursor, draw_threshold_line, draw_viewport_mask, zone_opacity};
pub use surface::{Composite, Surface};
pub use waveform::{
    draw_samples, draw_waveform, EnvelopeIndicator, RenderOutcome, WaveformRequest,
    ATTACK_COLOR, COMPRESSING_COLOR, RELEASE_COLOR,
};
