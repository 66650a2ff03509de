//! Zip a project's raw media.

use std::path::PathBuf;

use reelcut_archive::{DirectorySink, ZipExportJob, ZipExportOptions, ZipPhase};
use reelcut_common::config::AppConfig;
use reelcut_project_model::LoadedProject;

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    name: Option<String>,
    store: bool,
) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let mut options = ZipExportOptions::from_config(&config.archive);
    if let Some(name) = name {
        options.filename = name;
    }
    if store {
        options = options.stored();
    }

    let items = project.media_items();
    if items.is_empty() {
        println!("Project has no media to archive.");
        return Ok(());
    }
    println!("Archiving {} media item(s) from {}", items.len(), path.display());

    tracing::info!(
        items = items.len(),
        compression = ?options.compression,
        "Starting archive export"
    );

    let sink = DirectorySink::new(output.unwrap_or_else(|| project.exports_dir()));
    let job = ZipExportJob::new(options);

    let mut rx = job.subscribe();
    let reporter = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = rx.borrow_and_update().clone();
            println!(
                "  {:?}: {}% ({}/{} files)",
                p.phase, p.progress, p.completed_files, p.total_files
            );
            if matches!(p.phase, ZipPhase::Complete | ZipPhase::Error) {
                break;
            }
        }
    });

    let saved = job.run(items, None, &sink).await;
    reporter.abort();

    match saved {
        Ok(Some(path)) => println!("Archive written: {}", path.display()),
        Ok(None) => println!("Nothing to archive."),
        Err(e) => return Err(anyhow::anyhow!("Archive failed: {}", e.user_message())),
    }

    Ok(())
}
