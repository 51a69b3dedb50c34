//! Builds the standard preview frame as a command batch.
//!
//! A frame draws the whole file on the overview surface and the current
//! viewport on the preview surface, each as an uncompressed background
//! waveform with the compressed waveform on top. Cache keys cover every
//! input of a render plus a salt that is bumped whenever the audio changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::command::{
    Command, DrawPlaybackCursor, DrawThresholdLine, DrawViewportMask, DrawWaveform,
};
use crate::audio::{CompressorParams, PlayState, SampleBuffer, Viewport};
use crate::render::CacheKey;

/// Waveform colour of the uncompressed signal.
pub const OUTER_COLOR: &str = "#b26cc6";
/// Waveform colour of the compressed signal.
pub const INNER_COLOR: &str = "#ffcbfc";

/// Surface and buffer names used by [`PreviewScene`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneNames {
    pub overview: String,
    pub overview_overlay: String,
    pub preview: String,
    pub buffer: String,
}

impl Default for SceneNames {
    fn default() -> Self {
        Self {
            overview: "overview".to_string(),
            overview_overlay: "overviewOverlay".to_string(),
            preview: "preview".to_string(),
            buffer: "audio".to_string(),
        }
    }
}

/// Producer-side view state of one loaded file.
#[derive(Debug, Clone)]
pub struct PreviewScene {
    pub names: SceneNames,
    pub file_name: String,
    pub params: CompressorParams,
    pub viewport: Viewport,
    pub play_state: PlayState,
    buffer_length: usize,
    salt: u64,
}

impl PreviewScene {
    pub fn new(file_name: impl Into<String>, buffer: &SampleBuffer) -> Self {
        Self {
            names: SceneNames::default(),
            file_name: file_name.into(),
            params: CompressorParams::default(),
            viewport: Viewport::full(buffer),
            play_state: PlayState::default(),
            buffer_length: buffer.length(),
            salt: 1,
        }
    }

    pub fn salt(&self) -> u64 {
        self.salt
    }

    /// Invalidate every cache key built so far.
    pub fn bump_salt(&mut self) {
        self.salt += 1;
    }

    /// Swap in new audio: registers it and invalidates the cached renders.
    pub fn load_buffer(&mut self, buffer: Arc<SampleBuffer>) -> Command {
        self.bump_salt();
        self.buffer_length = buffer.length();
        self.viewport = self.viewport.clamp_to(self.buffer_length);
        Command::register_buffer(self.names.buffer.clone(), buffer)
    }

    /// The full redraw batch for the current state.
    pub fn frame_commands(&self) -> Vec<Command> {
        let names = &self.names;
        let whole = Viewport::new(0, self.buffer_length);
        let params = self.params;
        let viewport = self.viewport;

        vec![
            Command::clear(names.overview_overlay.clone()),
            Command::DrawViewportMask(DrawViewportMask {
                surface_name: names.overview_overlay.clone(),
                buffer_name: names.buffer.clone(),
                start_index: viewport.start_index,
                length: viewport.length,
            }),
            Command::clear(names.overview.clone()),
            self.waveform(
                "mini background",
                &names.overview,
                whole,
                OUTER_COLOR,
                CompressorParams::bypass(),
                CacheKey::new(&self.file_name).part(self.salt).build(),
            ),
            self.waveform(
                "mini foreground",
                &names.overview,
                whole,
                INNER_COLOR,
                params,
                self.params_key().part(self.salt).build(),
            ),
            Command::clear(names.preview.clone()),
            self.waveform(
                "preview background",
                &names.preview,
                viewport,
                OUTER_COLOR,
                CompressorParams::bypass(),
                CacheKey::new(&self.file_name)
                    .part(viewport.length)
                    .part(viewport.start_index)
                    .part(self.salt)
                    .build(),
            ),
            self.waveform(
                "preview foreground",
                &names.preview,
                viewport,
                INNER_COLOR,
                params,
                self.params_key()
                    .part(viewport.length)
                    .part(viewport.start_index)
                    .part(self.salt)
                    .build(),
            ),
            Command::DrawThresholdLine(DrawThresholdLine {
                surface_name: names.preview.clone(),
                db: params.threshold_db,
                ratio: params.ratio,
            }),
            Command::DrawPlaybackCursor(DrawPlaybackCursor {
                surface_name: names.preview.clone(),
                play_state: self.play_state,
                buffer_name: names.buffer.clone(),
                viewport,
            }),
            Command::flush(names.preview.clone()),
            Command::flush(names.overview.clone()),
            Command::flush(names.overview_overlay.clone()),
        ]
    }

    fn params_key(&self) -> CacheKey {
        CacheKey::new(&self.file_name)
            .part(self.params.threshold_db)
            .part(self.params.ratio)
            .part(self.params.attack_ms)
            .part(self.params.release_ms)
    }

    fn waveform(
        &self,
        label: &str,
        surface: &str,
        viewport: Viewport,
        color: &str,
        params: CompressorParams,
        cache_key: String,
    ) -> Command {
        Command::DrawWaveform(DrawWaveform {
            label: label.to_string(),
            surface_name: surface.to_string(),
            buffer_name: self.names.buffer.clone(),
            viewport,
            color: color.to_string(),
            threshold_db: params.threshold_db,
            ratio: params.ratio,
            attack_ms: params.attack_ms,
            release_ms: params.release_ms,
            cache_key: Some(cache_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_keys(batch: &[Command]) -> Vec<String> {
        batch
            .iter()
            .filter_map(|command| match command {
                Command::DrawWaveform(draw) => draw.cache_key.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_layout() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 1000], 1000);
        let scene = PreviewScene::new("kick.wav", &buffer);
        let kinds: Vec<&str> = scene.frame_commands().iter().map(Command::kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == "drawWaveform").count(), 4);
        assert_eq!(kinds.last(), Some(&"flush"));
        assert_eq!(kinds[0], "clearSurface");
    }

    #[test]
    fn test_cache_keys_track_inputs() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 1000], 1000);
        let mut scene = PreviewScene::new("kick.wav", &buffer);
        let before = cache_keys(&scene.frame_commands());
        assert_eq!(before[0], "kick.wav, 1");
        assert_eq!(before[1], "kick.wav, 0, 2, 0.2, 200, 1");

        scene.params.ratio = 4.0;
        let after = cache_keys(&scene.frame_commands());
        // backgrounds ignore the compressor settings
        assert_eq!(before[0], after[0]);
        assert_eq!(before[2], after[2]);
        assert_ne!(before[1], after[1]);
        assert_ne!(before[3], after[3]);
    }

    #[test]
    fn test_load_buffer_invalidates_keys() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 1000], 1000);
        let mut scene = PreviewScene::new("kick.wav", &buffer);
        let before = cache_keys(&scene.frame_commands());

        let command = scene.load_buffer(Arc::new(SampleBuffer::from_mono(vec![0.0; 10], 1000)));
        assert_eq!(command.kind(), "registerBuffers");
        assert_eq!(scene.viewport.end(), 10);
        let after = cache_keys(&scene.frame_commands());
        assert!(before.iter().zip(&after).all(|(a, b)| a != b));
    }
}
