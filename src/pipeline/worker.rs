//! Background consumer for the draw pipeline.
//!
//! Producers push batches through an unbounded channel; the worker task owns
//! the [`DrawPipeline`], runs one command per tick and yields back to the
//! scheduler in between so it never monopolises the runtime. `abort` never
//! travels through the channel: it is applied to the shared control flags
//! on the producer side so it reaches a command that is already running.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::command::Command;
use super::engine::{DrawPipeline, PipelineControl, QueueState};
use super::PipelineError;

/// Handle to a pipeline running on its own tokio task.
pub struct DrawWorker {
    batch_tx: UnboundedSender<Vec<Command>>,
    control: Arc<PipelineControl>,
    task: JoinHandle<DrawPipeline>,
}

impl DrawWorker {
    /// Move `pipeline` onto a new task. Must be called from within a tokio runtime.
    pub fn spawn(pipeline: DrawPipeline) -> Self {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let control = pipeline.control();
        let task = tokio::spawn(Self::run(pipeline, batch_rx));
        log::info!("Draw worker started");
        Self {
            batch_tx,
            control,
            task,
        }
    }

    pub fn send(&self, command: Command) -> Result<(), PipelineError> {
        self.send_batch(vec![command])
    }

    /// Queue a batch behind everything sent before it.
    pub fn send_batch(&self, batch: Vec<Command>) -> Result<(), PipelineError> {
        if self.batch_tx.is_closed() {
            return Err(PipelineError::WorkerClosed);
        }
        let batch: Vec<Command> = batch
            .into_iter()
            .filter(|command| {
                if command.is_abort() {
                    self.control.request_abort();
                    false
                } else {
                    true
                }
            })
            .collect();
        if batch.is_empty() {
            return Ok(());
        }
        self.batch_tx
            .send(batch)
            .map_err(|_| PipelineError::WorkerClosed)
    }

    /// Request cancellation of the running command, if any.
    pub fn abort(&self) -> bool {
        self.control.request_abort()
    }

    pub fn state(&self) -> QueueState {
        self.control.state()
    }

    pub fn control(&self) -> Arc<PipelineControl> {
        Arc::clone(&self.control)
    }

    /// Stop accepting batches, drain what was already sent and hand the
    /// pipeline back.
    pub async fn shutdown(self) -> Result<DrawPipeline, PipelineError> {
        drop(self.batch_tx);
        self.task.await.map_err(|e| {
            log::error!("Draw worker task failed: {}", e);
            PipelineError::WorkerClosed
        })
    }

    async fn run(
        mut pipeline: DrawPipeline,
        mut batch_rx: UnboundedReceiver<Vec<Command>>,
    ) -> DrawPipeline {
        loop {
            if pipeline.pending() == 0 {
                match batch_rx.recv().await {
                    Some(batch) => pipeline.submit(batch),
                    None => break,
                }
            }
            while let Ok(batch) = batch_rx.try_recv() {
                pipeline.submit(batch);
            }

            let _ = pipeline.tick();
            tokio::task::yield_now().await;
        }

        log::info!(
            "Draw worker stopped after {} commands",
            pipeline.commands_executed()
        );
        pipeline
    }
}
