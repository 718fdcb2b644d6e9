use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use mosaic_tiler::cli::Args;
use mosaic_tiler::config::TilingConfig;
use mosaic_tiler::diagnostics::LogSink;
use mosaic_tiler::Result;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Mosaic Tiler ===");

    if let Some(n_threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
        {
            warn!("Could not configure thread pool: {}", e);
        } else {
            info!("Using {} threads", n_threads);
        }
    }

    let file_config = match &args.config {
        Some(path) => TilingConfig::from_yaml_file(path)?,
        None => TilingConfig::default(),
    };
    let job = file_config.merge(args.overrides()).into_job()?;

    info!("Input: {}", job.input.display());
    info!("Output: {}", job.output_dir.display());

    let report = mosaic_tiler::run_job(&job, &LogSink, args.parallel_enabled())?;

    for raster in &report.rasters {
        info!(
            "{}: {} tiles",
            raster.path.display(),
            raster.tiles_written()
        );
    }

    info!("=== Done! {} tiles written ===", report.total_tiles());
    Ok(())
}
