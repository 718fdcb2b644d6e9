use log::{info, warn};
use std::path::PathBuf;
use std::sync::Mutex;

/// Progress and skip events raised while tiling.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RasterStarted {
        path: PathBuf,
        width: u32,
        height: u32,
        tiles: usize,
    },
    RasterSkipped {
        path: PathBuf,
        reason: String,
    },
    TileSkipped {
        tile: String,
        reason: String,
    },
    RasterFinished {
        path: PathBuf,
        written: usize,
        skipped: usize,
    },
}

/// Receiver for tiler diagnostics. Must be shareable across worker threads
/// when rasters are processed in parallel.
pub trait DiagnosticsSink: Sync {
    fn emit(&self, event: Diagnostic);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn emit(&self, event: Diagnostic) {
        match event {
            Diagnostic::RasterStarted {
                path,
                width,
                height,
                tiles,
            } => info!(
                "Processing {} ({}x{}) into {} tiles",
                path.display(),
                width,
                height,
                tiles
            ),
            Diagnostic::RasterSkipped { path, reason } => {
                warn!("Skipping {}: {}", path.display(), reason)
            }
            Diagnostic::TileSkipped { tile, reason } => warn!("Skipping tile {}: {}", tile, reason),
            Diagnostic::RasterFinished {
                path,
                written,
                skipped,
            } => info!(
                "Completed {}: {} tiles written, {} skipped",
                path.display(),
                written,
                skipped
            ),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn skipped_rasters(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Diagnostic::RasterSkipped { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, event: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
