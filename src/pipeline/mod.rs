//! Serialized draw-command pipeline.
//!
//! Producers build [`Command`] batches (optionally rate limited by a
//! [`DrawThrottle`]) and hand them to a [`DrawPipeline`], either directly or
//! through a [`DrawWorker`] running on a tokio task.

pub mod command;
pub mod engine;
pub mod scene;
pub mod throttle;
pub mod worker;

pub use command::{
    ClearSurface, Command, DrawPlaybackCursor, DrawSamples, DrawThresholdLine, DrawViewportMask,
    DrawWaveform, Flush, ResizeSurface,
};
pub use engine::{DrainReport, DrawPipeline, PipelineControl, QueueState};
pub use scene::PreviewScene;
pub use throttle::DrawThrottle;
pub use worker::DrawWorker;

use serde::{Deserialize, Serialize};

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of cached waveform bitmaps.
    pub cache_capacity: usize,
    /// Draw into per-surface back buffers and publish them on `flush`.
    pub double_buffer: bool,
    /// How often (in columns) a waveform render checks for an abort.
    pub cancel_poll_columns: usize,
    /// Default column count for `drawSamples`.
    pub sample_preview_width: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: crate::render::DEFAULT_CAPACITY,
            double_buffer: false,
            cancel_poll_columns: 64,
            sample_preview_width: 500,
        }
    }
}

impl PipelineConfig {
    /// Parse a config object; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Errors that can occur while executing commands.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unknown surface: {0}")]
    UnknownSurface(String),
    #[error("Unknown buffer: {0}")]
    UnknownBuffer(String),
    #[error("Buffer has no samples: {0}")]
    EmptyBuffer(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Command aborted")]
    Aborted,
    #[error("Draw worker is no longer running")]
    WorkerClosed,
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}
