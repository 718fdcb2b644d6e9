use crate::config::TilingConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mosaic-tiler")]
#[command(about = "Split geo-referenced mosaics into overlapping tiles with matching world files")]
#[command(version)]
pub struct Args {
    /// YAML file with input_dir, output_dir, tile_size and overlap
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input directory of rasters, or a single raster file
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output directory for tiles (created if missing)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Tile edge length in pixels [default: 4000]
    #[arg(short, long, value_name = "PIXELS")]
    pub tile_size: Option<u32>,

    /// Overlap between neighbouring tiles as a fraction of tile size [default: 0.2]
    #[arg(long, value_name = "FRACTION")]
    pub overlap: Option<f64>,

    /// Process rasters in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Number of worker threads; implies --parallel (default: all available)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Whether rasters are processed on the rayon pool.
    pub fn parallel_enabled(&self) -> bool {
        self.parallel || self.threads.is_some()
    }

    /// Settings given on the command line; unset flags stay `None`.
    pub fn overrides(&self) -> TilingConfig {
        TilingConfig {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            tile_size: self.tile_size,
            overlap: self.overlap,
        }
    }
}
