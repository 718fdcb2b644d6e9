use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid tile size: {0} (must be positive)")]
    InvalidTileSize(u32),

    #[error("Invalid overlap: {0} (must be in [0, 1))")]
    InvalidOverlap(f64),

    #[error("Tile size {tile_size} with overlap {overlap} gives a step below one pixel")]
    DegenerateStep { tile_size: u32, overlap: f64 },

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("No supported raster files found in {}", .0.display())]
    NoInputRasters(PathBuf),

    #[error("Unsupported raster extension: {}", .0.display())]
    UnsupportedRaster(PathBuf),

    #[error("World file not found: {}", .0.display())]
    MissingWorldFile(PathBuf),

    #[error("Incomplete world file {}: {lines} lines, expected 6", .path.display())]
    IncompleteWorldFile { path: PathBuf, lines: usize },

    #[error("Invalid value '{value}' on line {line} of world file {}", .path.display())]
    InvalidWorldFileValue {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Cannot open raster {}: {source}", .path.display())]
    RasterOpen {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Tile ({row}, {col}) falls outside a {width}x{height} raster")]
    InvalidTileBounds {
        row: u32,
        col: u32,
        width: u32,
        height: u32,
    },

    #[error("Cannot write {}: {reason}", .path.display())]
    TileWrite { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, TilerError>;
