use crate::config::TilingJob;
use crate::diagnostics::{Diagnostic, DiagnosticsSink, LogSink};
use crate::error::{Result, TilerError};
use crate::georef::WorldFile;
use crate::io::{self, RasterSource, PROJECTION_EXTENSION};
use crate::tiling::{tile_name, TileBounds, TileGrid};
use image::DynamicImage;
use log::{debug, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one input raster.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterOutcome {
    /// The raster was tiled; `skipped` counts tiles that could not be written.
    Tiled { written: usize, skipped: usize },
    /// The raster contributed no tiles.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterReport {
    pub path: PathBuf,
    pub outcome: RasterOutcome,
}

impl RasterReport {
    pub fn tiles_written(&self) -> usize {
        match self.outcome {
            RasterOutcome::Tiled { written, .. } => written,
            RasterOutcome::Skipped(_) => 0,
        }
    }
}

/// Per-raster outcomes of a batch, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilingReport {
    pub rasters: Vec<RasterReport>,
}

impl TilingReport {
    pub fn total_tiles(&self) -> usize {
        self.rasters.iter().map(RasterReport::tiles_written).sum()
    }

    pub fn rasters_tiled(&self) -> usize {
        self.rasters
            .iter()
            .filter(|r| matches!(r.outcome, RasterOutcome::Tiled { .. }))
            .count()
    }

    pub fn rasters_skipped(&self) -> usize {
        self.rasters.len() - self.rasters_tiled()
    }

    pub fn tiles_for(&self, path: &Path) -> Option<usize> {
        self.rasters
            .iter()
            .find(|r| r.path == path)
            .map(RasterReport::tiles_written)
    }
}

/// Tile every raster under `input_dir` into `output_dir`, logging
/// diagnostics through `log`.
pub fn tile_directory(
    input_dir: &Path,
    output_dir: &Path,
    tile_size: u32,
    overlap: f64,
) -> Result<TilingReport> {
    let job = TilingJob::new(
        input_dir.to_path_buf(),
        output_dir.to_path_buf(),
        tile_size,
        overlap,
    )?;
    run_job(&job, &LogSink, false)
}

/// Run a validated job. Fails only when nothing can be tiled at all or the
/// output directory cannot be created; every other problem is reported to
/// `sink` and recorded in the returned report.
pub fn run_job(job: &TilingJob, sink: &dyn DiagnosticsSink, parallel: bool) -> Result<TilingReport> {
    let sources = io::discover_rasters(&job.input)?;

    fs::create_dir_all(&job.output_dir)?;
    info!(
        "Tiling {} rasters into {} (tile_size={}, overlap={}, step={})",
        sources.len(),
        job.output_dir.display(),
        job.tile_size,
        job.overlap,
        job.step
    );

    let process = |source: &RasterSource| RasterReport {
        path: source.path.clone(),
        outcome: tile_raster(source, job, sink),
    };

    let rasters: Vec<RasterReport> = if parallel {
        sources.par_iter().map(process).collect()
    } else {
        sources.iter().map(process).collect()
    };

    let report = TilingReport { rasters };
    info!(
        "Wrote {} tiles from {} rasters ({} skipped)",
        report.total_tiles(),
        report.rasters_tiled(),
        report.rasters_skipped()
    );
    Ok(report)
}

/// Tile a single raster. Never fails: problems with the raster turn into
/// [`RasterOutcome::Skipped`], problems with a tile are counted and reported.
pub fn tile_raster(
    source: &RasterSource,
    job: &TilingJob,
    sink: &dyn DiagnosticsSink,
) -> RasterOutcome {
    let prepared = load_world_file(source).and_then(|(world, world_ext)| {
        let image = io::open_raster(&source.path)?;
        Ok((world, world_ext, image))
    });

    let (world, world_ext, image) = match prepared {
        Ok(p) => p,
        Err(e) => {
            let reason = e.to_string();
            sink.emit(Diagnostic::RasterSkipped {
                path: source.path.clone(),
                reason: reason.clone(),
            });
            return RasterOutcome::Skipped(reason);
        }
    };

    let (width, height) = (image.width(), image.height());
    let grid = TileGrid::new(width, height, job.tile_size, job.step);
    sink.emit(Diagnostic::RasterStarted {
        path: source.path.clone(),
        width,
        height,
        tiles: grid.total_tiles,
    });

    let projection = source.projection_file();
    let writer = TileWriter {
        source,
        output_dir: &job.output_dir,
        world: &world,
        world_ext: &world_ext,
        projection: projection.as_deref(),
    };

    let mut written = 0;
    let mut skipped = 0;
    for (row, col, bounds) in grid.iter() {
        let result = bounds
            .ok_or(TilerError::InvalidTileBounds {
                row,
                col,
                width,
                height,
            })
            .and_then(|b| writer.write(&image, &b));

        match result {
            Ok(()) => written += 1,
            Err(e) => {
                skipped += 1;
                sink.emit(Diagnostic::TileSkipped {
                    tile: tile_name(&source.base_name, row, col),
                    reason: e.to_string(),
                });
            }
        }
    }

    sink.emit(Diagnostic::RasterFinished {
        path: source.path.clone(),
        written,
        skipped,
    });
    RasterOutcome::Tiled { written, skipped }
}

fn load_world_file(source: &RasterSource) -> Result<(WorldFile, String)> {
    let path = source.locate_world_file()?;
    let world = WorldFile::read(&path)?;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((world, ext))
}

struct TileWriter<'a> {
    source: &'a RasterSource,
    output_dir: &'a Path,
    world: &'a WorldFile,
    world_ext: &'a str,
    projection: Option<&'a Path>,
}

impl TileWriter<'_> {
    fn output_path(&self, name: &str, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", name, ext))
    }

    /// Write the image, world file and projection copy of one tile. On
    /// failure whatever was already written for the tile is removed.
    fn write(&self, image: &DynamicImage, bounds: &TileBounds) -> Result<()> {
        let name = tile_name(&self.source.base_name, bounds.row, bounds.col);
        let image_path = self.output_path(&name, &self.source.extension);
        let world_path = self.output_path(&name, self.world_ext);
        let projection_path = self.output_path(&name, PROJECTION_EXTENSION);

        let result = self.write_files(image, bounds, &image_path, &world_path, &projection_path);
        if result.is_err() {
            for path in [&image_path, &world_path, &projection_path] {
                if path.is_file() {
                    let _ = fs::remove_file(path);
                }
            }
        }
        result
    }

    fn write_files(
        &self,
        image: &DynamicImage,
        bounds: &TileBounds,
        image_path: &Path,
        world_path: &Path,
        projection_path: &Path,
    ) -> Result<()> {
        let tile = image.crop_imm(bounds.left, bounds.upper, bounds.width(), bounds.height());
        io::save_tile_image(&tile, self.source.format, image_path).map_err(|e| {
            TilerError::TileWrite {
                path: image_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        self.world
            .translated(bounds.left, bounds.upper)
            .write(world_path)
            .map_err(|e| TilerError::TileWrite {
                path: world_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if let Some(projection) = self.projection {
            io::copy_projection(projection, projection_path).map_err(|e| {
                TilerError::TileWrite {
                    path: projection_path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
        }

        debug!("Tile {} written", image_path.display());
        Ok(())
    }
}
