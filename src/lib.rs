//! Squash Preview Core
//!
//! Rendering engine for previewing dynamic-range compression on audio.
//!
//! # Features
//!
//! - Streaming envelope-follower compressor for export and drawing
//! - Per-pixel compressed waveform rendering with an envelope indicator strip
//! - Bounded bitmap cache with bulk FIFO eviction and hit statistics
//! - Serialized draw-command pipeline with a JSON protocol, a tokio worker,
//!   producer-side throttling and cooperative cancellation

pub mod audio;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use audio::{
    compress, render_compressed, CompressorParams, Envelope, ExportOptions, PlayState,
    SampleBuffer, Viewport,
};
pub use pipeline::{
    Command, DrainReport, DrawPipeline, DrawThrottle, DrawWorker, PipelineConfig, PipelineError,
    PreviewScene, QueueState,
};
pub use render::{parse_hex_color, CacheKey, RenderCache, Surface};
