//! Draw commands exchanged between the producer and the draw pipeline.
//!
//! Commands reference surfaces and buffers by name. Everything except the
//! two registration commands (which move owned resources) also has a JSON
//! form: an object tagged by `"action"` with camelCase fields.
//!
//! ```
//! use squash_preview::pipeline::Command;
//!
//! let batch = Command::parse_batch(
//!     r#"[{"action": "clearSurface", "name": "preview"},
//!         {"action": "flush", "surfaceName": "preview"}]"#,
//! )
//! .unwrap();
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch[0].kind(), "clearSurface");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::{CompressorParams, PlayState, SampleBuffer, Viewport};
use crate::render::Surface;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Hand surfaces over to the pipeline (last write wins per name).
    #[serde(skip)]
    RegisterSurfaces(HashMap<String, Surface>),
    /// Register decoded audio (last write wins per name).
    #[serde(skip)]
    RegisterBuffers(HashMap<String, Arc<SampleBuffer>>),
    ResizeSurface(ResizeSurface),
    ClearSurface(ClearSurface),
    DrawWaveform(DrawWaveform),
    DrawSamples(DrawSamples),
    DrawPlaybackCursor(DrawPlaybackCursor),
    DrawThresholdLine(DrawThresholdLine),
    DrawViewportMask(DrawViewportMask),
    Flush(Flush),
    /// Ask the running command to stop early.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeSurface {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearSurface {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawWaveform {
    /// Statistics bucket for cache hits and misses.
    pub label: String,
    pub surface_name: String,
    pub buffer_name: String,
    pub viewport: Viewport,
    /// `#rrggbb` or `#rrggbbaa`.
    pub color: String,
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    /// Memoize the render under this key when set.
    #[serde(default)]
    pub cache_key: Option<String>,
}

impl DrawWaveform {
    pub fn params(&self) -> CompressorParams {
        CompressorParams::new(self.threshold_db, self.ratio, self.attack_ms, self.release_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSamples {
    pub surface_name: String,
    pub samples: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPlaybackCursor {
    pub surface_name: String,
    pub play_state: PlayState,
    pub buffer_name: String,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawThresholdLine {
    pub surface_name: String,
    pub db: f32,
    pub ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawViewportMask {
    pub surface_name: String,
    pub buffer_name: String,
    pub start_index: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flush {
    pub surface_name: String,
}

impl Command {
    pub fn register_surface(name: impl Into<String>, surface: Surface) -> Self {
        Self::RegisterSurfaces(HashMap::from([(name.into(), surface)]))
    }

    pub fn register_buffer(name: impl Into<String>, buffer: Arc<SampleBuffer>) -> Self {
        Self::RegisterBuffers(HashMap::from([(name.into(), buffer)]))
    }

    pub fn clear(name: impl Into<String>) -> Self {
        Self::ClearSurface(ClearSurface { name: name.into() })
    }

    pub fn flush(surface_name: impl Into<String>) -> Self {
        Self::Flush(Flush {
            surface_name: surface_name.into(),
        })
    }

    pub fn resize(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::ResizeSurface(ResizeSurface {
            name: name.into(),
            width,
            height,
        })
    }

    /// Protocol name of the command, as used in the `"action"` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterSurfaces(_) => "registerSurfaces",
            Self::RegisterBuffers(_) => "registerBuffers",
            Self::ResizeSurface(_) => "resizeSurface",
            Self::ClearSurface(_) => "clearSurface",
            Self::DrawWaveform(_) => "drawWaveform",
            Self::DrawSamples(_) => "drawSamples",
            Self::DrawPlaybackCursor(_) => "drawPlaybackCursor",
            Self::DrawThresholdLine(_) => "drawThresholdLine",
            Self::DrawViewportMask(_) => "drawViewportMask",
            Self::Flush(_) => "flush",
            Self::Abort => "abort",
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort)
    }

    /// Parse one command object or an array of them.
    pub fn parse_batch(json: &str) -> Result<Vec<Command>, serde_json::Error> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Array(items) => {
                items.into_iter().map(serde_json::from_value).collect()
            }
            single => Ok(vec![serde_json::from_value(single)?]),
        }
    }
}
