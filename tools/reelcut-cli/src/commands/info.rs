//! Show project information.

use std::path::PathBuf;

use reelcut_project_model::LoadedProject;

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project.timeline)?);
        return Ok(());
    }

    let p = &project.project;
    let timeline = &project.timeline;
    let canvas = timeline.canvas_size();

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Media ({}):", p.media.len());
    for item in &p.media {
        let location = item
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<inline>".to_string());
        println!("  {} [{:?}] {} ({})", item.id, item.kind, item.name, location);
    }
    println!();

    println!("Timeline:");
    println!(
        "  Canvas: {}x{} @ {}fps",
        canvas.width, canvas.height, timeline.fps
    );
    println!("  Duration: {:.2}s", timeline.duration());
    println!("  Background: {}", timeline.background);
    for track in &timeline.tracks {
        println!(
            "  Track '{}' ({:?}): {} element(s), volume {:.2}{}",
            track.name,
            track.kind,
            track.elements.len(),
            track.volume,
            if track.muted { ", muted" } else { "" }
        );
    }
    println!();

    println!("Export settings:");
    println!("  Format: {}", p.export.format);
    println!(
        "  Quality: {} ({}x{})",
        p.export.quality.label(),
        p.export.width,
        p.export.height
    );
    println!("  Filename: {}", p.export.filename);

    Ok(())
}
