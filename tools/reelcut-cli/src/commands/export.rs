//! Render a project's timeline to a video file.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use reelcut_common::config::AppConfig;
use reelcut_common::error::ReelcutError;
use reelcut_project_model::export::{ExportFormat, ExportQuality};
use reelcut_project_model::LoadedProject;
use reelcut_render_engine::export::{
    ExportEngine, ExportRequest, ExportState, ExportWarning, SystemCapabilities,
};
use reelcut_render_engine::media::MediaLibrary;

pub struct ExportArgs {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub name: Option<String>,
    pub font: Option<PathBuf>,
}

pub async fn run(config: &AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    println!("Exporting project at: {}", args.path.display());

    let project = LoadedProject::load(&args.path)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let mut settings = project.project.export.clone();
    if let Some(format) = &args.format {
        settings.format = ExportFormat::parse(format)
            .ok_or_else(|| anyhow::anyhow!("Unknown format: {format}. Use: mp4, webm, mov"))?;
    }
    if let Some(quality) = &args.quality {
        settings.quality = ExportQuality::parse(quality)
            .ok_or_else(|| anyhow::anyhow!("Unknown quality: {quality}. Use: high, medium, low"))?;
        (settings.width, settings.height) = settings.quality.resolution();
    }
    if let Some(name) = args.name {
        settings.filename = name;
    }

    let mut capabilities = SystemCapabilities::from_config(&config.export);
    if let Some(font) = &args.font {
        capabilities = capabilities
            .with_font_path(font)
            .map_err(|e| anyhow::anyhow!("Failed to load font: {e}"))?;
    }

    let media = MediaLibrary::from_items(
        &project.media_items(),
        None,
        config.export.ffmpeg_binary.clone(),
    );

    println!("  Format: {}", settings.format);
    println!(
        "  Quality: {} ({}x{})",
        settings.quality.label(),
        settings.width,
        settings.height
    );
    println!("  Duration: {:.2}s @ {}fps", project.timeline.duration(), project.timeline.fps);

    tracing::info!(
        project = %args.path.display(),
        format = %settings.format,
        width = settings.width,
        height = settings.height,
        "Starting export"
    );

    let engine = ExportEngine::new(Arc::new(capabilities), Arc::new(media));

    let cancel = engine.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n  Cancelling after the current frame...");
            cancel.cancel();
        }
    });

    let mut rx = engine.subscribe();
    let reporter = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = rx.borrow_and_update().clone();
            match p.state {
                ExportState::Rendering => print!(
                    "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                    p.progress, p.current_frame, p.total_frames, p.estimated_time_remaining,
                ),
                ExportState::Encoding => print!("\r  {}                              ", p.status),
                _ => {}
            }
            std::io::stdout().flush().ok();
            if p.state.is_terminal() {
                break;
            }
        }
    });

    let result = engine
        .export_video(ExportRequest {
            timeline: project.timeline.clone(),
            settings,
        })
        .await;

    interrupt.abort();
    reporter.abort();
    println!();

    let result = match result {
        Ok(result) => result,
        Err(ReelcutError::Cancelled) => {
            tracing::info!("Export cancelled by user");
            println!("Export cancelled.");
            return Ok(());
        }
        Err(e) => return Err(anyhow::anyhow!("Export failed: {}", e.user_message())),
    };

    let output_path = args
        .output
        .unwrap_or_else(|| project.exports_dir().join(&result.file_name));
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    result.blob.write_to(&output_path)?;
    tracing::info!(path = %output_path.display(), bytes = result.blob.len(), "Export written");

    for warning in &result.metadata.warnings {
        match warning {
            ExportWarning::UnsupportedFormat { requested, used } => {
                println!("  [WARN] {requested} is not supported; encoded as {used}");
            }
            ExportWarning::HighMemory { estimated_mb } => {
                println!("  [WARN] High memory usage during export (~{estimated_mb} MB)");
            }
        }
    }

    println!(
        "Export complete: {} ({} frames, {} bytes)",
        output_path.display(),
        result.metadata.frame_count,
        result.blob.len()
    );

    Ok(())
}
