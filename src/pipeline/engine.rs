//! The draw pipeline: resource registries, the command queue and command execution.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::command::{
    Command, DrawPlaybackCursor, DrawSamples, DrawThresholdLine, DrawViewportMask, DrawWaveform,
};
use super::{PipelineConfig, PipelineError};
use crate::audio::SampleBuffer;
use crate::render::{
    draw_playback_cursor, draw_samples, draw_threshold_line, draw_viewport_mask, draw_waveform,
    parse_hex_color, CacheStatsTable, RenderCache, RenderOutcome, Surface, WaveformRequest,
};

/// Whether the queue is currently being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Working,
}

/// Flags shared between the pipeline and whoever feeds it.
///
/// The only state visible from outside the consumer: the producer reads
/// `state()` and raises the cancel flag, the consumer does everything else.
#[derive(Debug, Default)]
pub struct PipelineControl {
    cancel: AtomicBool,
    working: AtomicBool,
}

impl PipelineControl {
    pub fn state(&self) -> QueueState {
        if self.working.load(Ordering::Acquire) {
            QueueState::Working
        } else {
            QueueState::Idle
        }
    }

    /// Raise the cancel flag if a command is in flight.
    ///
    /// Returns whether the flag was raised; an abort while idle is dropped.
    pub fn request_abort(&self) -> bool {
        if self.state() == QueueState::Working {
            self.cancel.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub fn is_abort_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Per-column cancel check that only reads the flag every `poll_every` columns.
    pub fn cancel_poll(&self, poll_every: usize) -> impl Fn(u32) -> bool + '_ {
        let poll_every = poll_every.max(1);
        move |x| x as usize % poll_every == 0 && self.is_abort_requested()
    }

    fn set_working(&self, working: bool) {
        self.working.store(working, Ordering::Release);
    }

    fn reset_abort(&self) {
        self.cancel.store(false, Ordering::Release);
    }
}

/// Surfaces by name, plus back buffers when double-buffering.
#[derive(Debug, Default)]
struct SurfaceRegistry {
    visible: HashMap<String, Surface>,
    back: HashMap<String, Surface>,
    double_buffer: bool,
}

impl SurfaceRegistry {
    fn register(&mut self, name: String, surface: Surface) {
        if self.double_buffer {
            self.back
                .insert(name.clone(), Surface::new(surface.width(), surface.height()));
        }
        self.visible.insert(name, surface);
    }

    fn visible_mut(&mut self, name: &str) -> Result<&mut Surface, PipelineError> {
        self.visible
            .get_mut(name)
            .ok_or_else(|| PipelineError::UnknownSurface(name.to_string()))
    }

    /// The surface draw commands write into.
    fn target_mut(&mut self, name: &str) -> Result<&mut Surface, PipelineError> {
        if self.double_buffer {
            self.back
                .get_mut(name)
                .ok_or_else(|| PipelineError::UnknownSurface(name.to_string()))
        } else {
            self.visible_mut(name)
        }
    }

    fn resize(&mut self, name: &str, width: u32, height: u32) -> Result<(), PipelineError> {
        self.visible_mut(name)?.resize(width, height);
        if let Some(back) = self.back.get_mut(name) {
            back.resize(width, height);
        }
        Ok(())
    }

    fn flush(&mut self, name: &str) -> Result<(), PipelineError> {
        let visible = self
            .visible
            .get_mut(name)
            .ok_or_else(|| PipelineError::UnknownSurface(name.to_string()))?;
        if !self.double_buffer {
            return Ok(());
        }
        let back = self
            .back
            .get(name)
            .ok_or_else(|| PipelineError::UnknownSurface(name.to_string()))?;
        visible.clear();
        visible.blit(back.image());
        Ok(())
    }
}

/// Outcome of draining the queue.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Commands taken off the queue, failed ones included.
    pub executed: usize,
    /// Failed commands with their protocol name.
    pub failures: Vec<(&'static str, PipelineError)>,
}

/// Serialized executor of draw commands.
///
/// Owns every registered surface and buffer, the render cache and its
/// statistics. Commands run strictly in submission order, one per
/// [`tick`](Self::tick); a failing command never affects the rest of the queue.
#[derive(Debug)]
pub struct DrawPipeline {
    config: PipelineConfig,
    surfaces: SurfaceRegistry,
    buffers: HashMap<String, Arc<SampleBuffer>>,
    cache: RenderCache,
    stats: CacheStatsTable,
    queue: VecDeque<Command>,
    control: Arc<PipelineControl>,
    executed: u64,
}

impl Default for DrawPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl DrawPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            surfaces: SurfaceRegistry {
                double_buffer: config.double_buffer,
                ..Default::default()
            },
            buffers: HashMap::new(),
            cache: RenderCache::new(config.cache_capacity),
            stats: CacheStatsTable::default(),
            queue: VecDeque::new(),
            control: Arc::new(PipelineControl::default()),
            executed: 0,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn control(&self) -> Arc<PipelineControl> {
        Arc::clone(&self.control)
    }

    pub fn state(&self) -> QueueState {
        self.control.state()
    }

    /// Commands waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total commands executed over the pipeline's lifetime.
    pub fn commands_executed(&self) -> u64 {
        self.executed
    }

    /// Visible surface by name.
    pub fn surface(&self, name: &str) -> Option<&Surface> {
        self.surfaces.visible.get(name)
    }

    /// Back buffer by name (double-buffering only).
    pub fn back_buffer(&self, name: &str) -> Option<&Surface> {
        self.surfaces.back.get(name)
    }

    pub fn buffer(&self, name: &str) -> Option<&Arc<SampleBuffer>> {
        self.buffers.get(name)
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> &CacheStatsTable {
        &self.stats
    }

    /// Append a batch to the queue in order.
    ///
    /// `abort` is not queued: it raises the cancel flag right away when a
    /// command is running and is dropped otherwise.
    pub fn submit(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            if command.is_abort() {
                let raised = self.control.request_abort();
                log::debug!("abort requested (in flight: {})", raised);
            } else {
                self.queue.push_back(command);
            }
        }
    }

    /// Run the next queued command to completion.
    ///
    /// Returns `None` when the queue was empty. The queue reports `Working`
    /// while a command runs and returns to `Idle` once it is empty again.
    pub fn tick(&mut self) -> Option<Result<(), PipelineError>> {
        let Some(command) = self.queue.pop_front() else {
            self.control.set_working(false);
            return None;
        };
        self.control.set_working(true);

        let kind = command.kind();
        log::debug!("executing {} ({} pending)", kind, self.queue.len());
        let result = self.execute(command);
        match &result {
            Ok(()) => {}
            Err(PipelineError::Aborted) => log::info!("{} aborted", kind),
            Err(e) => log::warn!("{} failed: {}", kind, e),
        }

        self.executed += 1;
        self.control.reset_abort();
        if self.queue.is_empty() {
            self.control.set_working(false);
        }
        Some(result)
    }

    /// Tick until the queue is empty.
    pub fn run_until_idle(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            let kind = match self.queue.front() {
                Some(command) => command.kind(),
                None => break,
            };
            match self.tick() {
                Some(Ok(())) => {}
                Some(Err(e)) => report.failures.push((kind, e)),
                None => break,
            }
            report.executed += 1;
        }
        report
    }

    /// Execute one command immediately, bypassing the queue.
    pub fn execute(&mut self, command: Command) -> Result<(), PipelineError> {
        match command {
            Command::RegisterSurfaces(surfaces) => {
                for (name, surface) in surfaces {
                    self.surfaces.register(name, surface);
                }
                Ok(())
            }
            Command::RegisterBuffers(buffers) => {
                self.buffers.extend(buffers);
                Ok(())
            }
            Command::ResizeSurface(resize) => {
                self.surfaces.resize(&resize.name, resize.width, resize.height)
            }
            Command::ClearSurface(clear) => {
                self.surfaces.target_mut(&clear.name)?.clear();
                Ok(())
            }
            Command::DrawWaveform(draw) => self.draw_waveform(&draw),
            Command::DrawSamples(draw) => self.draw_samples(&draw),
            Command::DrawPlaybackCursor(draw) => self.draw_playback_cursor(&draw),
            Command::DrawThresholdLine(draw) => self.draw_threshold_line(&draw),
            Command::DrawViewportMask(draw) => self.draw_viewport_mask(&draw),
            Command::Flush(flush) => self.surfaces.flush(&flush.surface_name),
            Command::Abort => {
                self.control.request_abort();
                Ok(())
            }
        }
    }

    fn lookup_buffer(&self, name: &str) -> Result<Arc<SampleBuffer>, PipelineError> {
        self.buffers
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownBuffer(name.to_string()))
    }

    fn draw_waveform(&mut self, draw: &DrawWaveform) -> Result<(), PipelineError> {
        let target = self.surfaces.target_mut(&draw.surface_name)?;

        if let Some(cached) = draw.cache_key.as_deref().and_then(|key| self.cache.get(key)) {
            self.stats.record_hit(&draw.label);
            log::trace!("cache hit for {}", draw.label);
            target.blit_scaled(cached);
            return Ok(());
        }
        self.stats.record_miss(&draw.label);
        log::trace!("cache miss for {}", draw.label);

        let color = parse_hex_color(&draw.color)
            .ok_or_else(|| PipelineError::InvalidColor(draw.color.clone()))?;
        let buffer = self
            .buffers
            .get(&draw.buffer_name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownBuffer(draw.buffer_name.clone()))?;
        if buffer.is_empty() {
            return Err(PipelineError::EmptyBuffer(draw.buffer_name.clone()));
        }

        let request = WaveformRequest {
            viewport: draw.viewport,
            color,
            params: draw.params(),
        };
        let should_cancel = self.control.cancel_poll(self.config.cancel_poll_columns);

        match &draw.cache_key {
            Some(key) => {
                let mut bitmap = Surface::new(target.width(), target.height());
                if let RenderOutcome::Cancelled { at } =
                    draw_waveform(&mut bitmap, &buffer, &request, should_cancel)
                {
                    log::debug!("discarding partial render of {} at column {}", key, at);
                    return Err(PipelineError::Aborted);
                }
                let bitmap = bitmap.into_image();
                target.blit_scaled(&bitmap);
                self.cache.add(key.clone(), bitmap);
            }
            None => {
                if let RenderOutcome::Cancelled { .. } =
                    draw_waveform(target, &buffer, &request, should_cancel)
                {
                    return Err(PipelineError::Aborted);
                }
            }
        }
        Ok(())
    }

    fn draw_samples(&mut self, draw: &DrawSamples) -> Result<(), PipelineError> {
        let max_width = draw.max_width.unwrap_or(self.config.sample_preview_width);
        let target = self.surfaces.target_mut(&draw.surface_name)?;
        draw_samples(target, &draw.samples, max_width);
        Ok(())
    }

    fn draw_playback_cursor(&mut self, draw: &DrawPlaybackCursor) -> Result<(), PipelineError> {
        let buffer = self.lookup_buffer(&draw.buffer_name)?;
        let target = self.surfaces.target_mut(&draw.surface_name)?;
        draw_playback_cursor(target, draw.play_state, &buffer, draw.viewport);
        Ok(())
    }

    fn draw_threshold_line(&mut self, draw: &DrawThresholdLine) -> Result<(), PipelineError> {
        let target = self.surfaces.target_mut(&draw.surface_name)?;
        draw_threshold_line(target, draw.db, draw.ratio);
        Ok(())
    }

    fn draw_viewport_mask(&mut self, draw: &DrawViewportMask) -> Result<(), PipelineError> {
        let buffer = self.lookup_buffer(&draw.buffer_name)?;
        let target = self.surfaces.target_mut(&draw.surface_name)?;
        draw_viewport_mask(target, &buffer, draw.start_index, draw.length);
        Ok(())
    }
}
