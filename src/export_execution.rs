use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::channel;
use tracing::{debug, error, info};

use anyhow::{anyhow, Result};

use crate::common;
use crate::diagram::Diagram;
use crate::export;
use crate::mld;
use crate::project;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ExportFormat {
    Sql,
    Mermaid,
    Json,
}

/// Load → verify → derive → render → write, with optional re-run on project
/// file changes.
pub fn run_export(
    project_path: &str,
    format: ExportFormat,
    output: Option<&str>,
    watch: bool,
) -> Result<()> {
    let path = Path::new(project_path);
    run_once(path, format, output)?;

    if watch {
        watch_for_changes(path, format, output)?;
    }

    Ok(())
}

fn run_once(path: &Path, format: ExportFormat, output: Option<&str>) -> Result<()> {
    let diagram = project::load_project(path)?;

    let content = render(&diagram, format)?;
    match output {
        Some(filename) => {
            info!("Writing {:?} export to {}", format, filename);
            common::write_string_to_file(filename, &content)?;
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn render(diagram: &Diagram, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Sql => {
            let mld = mld::derive(diagram)?;
            export::to_sql::render(&mld).map_err(|e| anyhow!("Failed to render SQL: {}", e))
        }
        ExportFormat::Json => {
            let mld = mld::derive(diagram)?;
            export::to_json::render(&mld).map_err(|e| anyhow!("Failed to render JSON: {}", e))
        }
        ExportFormat::Mermaid => export::to_mermaid::render(diagram)
            .map_err(|e| anyhow!("Failed to render Mermaid: {}", e)),
    }
}

/// Re-runs the export whenever the project file is modified. A failing
/// re-run is reported and the watch keeps going, so a half-saved file does
/// not kill the loop.
fn watch_for_changes(path: &Path, format: ExportFormat, output: Option<&str>) -> Result<()> {
    info!("Watching {} for changes", path.display());

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;

    loop {
        match rx.recv() {
            Ok(event) => {
                if let Ok(event) = event {
                    if let EventKind::Modify(_) = event.kind {
                        debug!("File modified {:?}", event.paths);
                        info!("Change detected, re-running export");
                        if let Err(e) = run_once(path, format, output) {
                            error!("Export failed: {}", e);
                        }
                    }
                }
            }
            Err(e) => error!("Watch error: {:?}", e),
        }
    }
}
