//! Validate a reelcut project bundle.

use std::path::PathBuf;

use reelcut_project_model::LoadedProject;
use reelcut_render_engine::validate::{estimate_memory_usage, validate_file, validate_timeline, FileDescriptor};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let timeline = &project.timeline;
    let canvas = timeline.canvas_size();
    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!("  Canvas: {}x{}", canvas.width, canvas.height);
    println!("  FPS: {}", timeline.fps);
    println!("  Elements: {}", timeline.elements().count());

    let mut issues = project.validate_sources();

    for item in project.media_items() {
        let Some(source) = item.path.as_deref() else {
            continue;
        };
        if !source.exists() {
            continue;
        }
        match FileDescriptor::from_path(source).and_then(|file| validate_file(&file)) {
            Ok(()) => {}
            Err(e) => issues.push(format!("Media '{}': {e}", item.id)),
        }
    }

    if let Err(e) = validate_timeline(timeline) {
        issues.push(format!("Timeline: {e}"));
    } else {
        let (width, height) = project.project.export.quality.resolution();
        let estimate = estimate_memory_usage(width, height, timeline.duration(), timeline.fps);
        println!("  Estimated export memory: {} MB", estimate.estimated_mb);
        if let Some(warning) = estimate.warning() {
            println!("  [WARN] {warning}");
        }
    }

    if issues.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Project may not export cleanly.",
            issues.len()
        );
    }

    Ok(())
}
