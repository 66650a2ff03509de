//! Initialize a new reelcut project.

use std::path::PathBuf;

use reelcut_common::config::ExportDefaults;
use reelcut_project_model::{CanvasSize, ExportSettings, LoadedProject};

pub fn run(
    name: String,
    output: PathBuf,
    width: u32,
    height: u32,
    fps: u32,
    defaults: &ExportDefaults,
) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("Canvas size must be positive, got {width}x{height}");
    }

    let project_dir = output.join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let canvas = CanvasSize { width, height };
    let mut project = LoadedProject::create(&project_dir, &name, Some(canvas), fps)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    let (settings, unknown) = ExportSettings::from_names(&defaults.format, &defaults.quality);
    for value in &unknown {
        tracing::warn!(value = %value, "Unknown export default in config; using built-in default");
    }
    project.project.export = settings;
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    tracing::info!(path = %project.root.display(), "Project created");

    let export = &project.project.export;
    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Canvas: {}x{}", width, height);
    println!("  FPS: {fps}");
    println!(
        "  Export: {} {} ({}x{})",
        export.format,
        export.quality.label(),
        export.width,
        export.height
    );
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── media/       (imported media files)");
    println!("  ├── meta/        (project.json, timeline.json)");
    println!("  └── exports/     (rendered videos and archives)");

    Ok(())
}
