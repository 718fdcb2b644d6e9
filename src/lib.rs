// Library exports for testing and reuse

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod georef;
pub mod io;
pub mod tiler;
pub mod tiling;

// Re-export commonly used types
pub use config::{TilingConfig, TilingJob};
pub use diagnostics::{Diagnostic, DiagnosticsSink, LogSink, MemorySink};
pub use error::{Result, TilerError};
pub use georef::WorldFile;
pub use tiler::{run_job, tile_directory, tile_raster, RasterOutcome, RasterReport, TilingReport};
pub use tiling::{compute_tile_bounds, TileBounds, TileGrid};
