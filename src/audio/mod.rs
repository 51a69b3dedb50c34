//! Audio buffers, compression and export.
//!
//! This module provides:
//! - Planar sample buffers and viewports into them
//! - The envelope-follower compressor shared by export and drawing
//! - Viewport export through the full per-sample compressor
//! - Synthetic test signals

pub mod buffer;
pub mod compressor;
pub mod export;
pub mod synth;

pub use buffer::{PlayState, SampleBuffer, Viewport};
pub use compressor::{
    clamp_output, coefficient, compress, CompressorParams, Envelope, EnvelopeStep,
};
pub use export::{render_compressed, ExportOptions};
pub use synth::{
    generate_constant, generate_kick_loop, generate_sine, generate_tone_burst,
    generate_white_noise,
};
