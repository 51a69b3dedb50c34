//! Example: Drive a preview session from synthetic audio.
//!
//! Generates a kick loop, sweeps the compressor threshold the way a user
//! dragging a knob would, and writes the final frame of each surface as PNG.
//!
//! Run with:
//!     RUST_LOG=debug cargo run --example preview_session -- [output_dir]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use squash_preview::audio::{generate_kick_loop, render_compressed, ExportOptions};
use squash_preview::pipeline::{Command, DrawThrottle, DrawWorker, PipelineConfig, PreviewScene};
use squash_preview::{DrawPipeline, PlayState, SampleBuffer, Surface, Viewport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let sample_rate: u32 = 44100;
    let buffer = Arc::new(SampleBuffer::from_mono(
        generate_kick_loop(124.0, sample_rate, 8.0),
        sample_rate,
    ));
    println!(
        "Generated {:.1}s kick loop ({} samples)",
        buffer.duration(),
        buffer.length()
    );

    let mut scene = PreviewScene::new("kick_loop.wav", &buffer);
    scene.params.ratio = 4.0;
    scene.params.release_ms = 120.0;
    scene.viewport = Viewport::new(buffer.length() / 4, buffer.length() / 4);

    let worker = DrawWorker::spawn(DrawPipeline::new(PipelineConfig {
        double_buffer: true,
        ..Default::default()
    }));
    worker.send_batch(vec![
        Command::register_surface(scene.names.overview.clone(), Surface::new(800, 64)),
        Command::register_surface(scene.names.overview_overlay.clone(), Surface::new(800, 64)),
        Command::register_surface(scene.names.preview.clone(), Surface::new(1200, 255)),
        scene.load_buffer(Arc::clone(&buffer)),
    ])?;

    // threshold sweep at 100 updates/s, throttled to 30 frames/s
    let mut throttle = DrawThrottle::default();
    let mut sent = 0;
    for step in 0..=60 {
        scene.params.threshold_db = -0.5 * step as f32;
        scene.play_state = PlayState {
            playing: true,
            time: step as f64 * 0.01,
        };

        let now = Instant::now();
        if let Some(batch) = throttle.offer(scene.frame_commands(), now) {
            worker.send_batch(batch)?;
            sent += 1;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Some(batch) = throttle.poll(Instant::now()) {
            worker.send_batch(batch)?;
            sent += 1;
        }
    }
    if let Some(deadline) = throttle.next_deadline() {
        tokio::time::sleep_until(deadline.into()).await;
        if let Some(batch) = throttle.poll(Instant::now()) {
            worker.send_batch(batch)?;
            sent += 1;
        }
    }
    println!(
        "Sent {} frames, coalesced {} updates",
        sent,
        throttle.coalesced()
    );

    let pipeline = worker.shutdown().await?;
    println!("Executed {} commands", pipeline.commands_executed());
    println!("Cache:\n{}", pipeline.cache_stats());

    for name in [&scene.names.overview, &scene.names.preview] {
        let path = output_dir.join(format!("{}.png", name));
        pipeline
            .surface(name)
            .with_context(|| format!("surface {} was not registered", name))?
            .save_png(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    let export = render_compressed(
        &buffer,
        scene.viewport,
        &scene.params,
        ExportOptions { normalize: true },
    );
    println!(
        "Exported {} compressed samples at {} Hz",
        export.length(),
        export.sample_rate
    );

    Ok(())
}
