use crate::error::{Result, TilerError};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TILE_SIZE: u32 = 4000;
pub const DEFAULT_OVERLAP: f64 = 0.2;

/// Tiling settings as read from a YAML file or the command line.
///
/// Every field is optional so a file and CLI flags can be layered; the
/// merged result is checked by [`TilingConfig::into_job`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilingConfig {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub tile_size: Option<u32>,
    pub overlap: Option<f64>,
}

impl TilingConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        debug!("Loading config: {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: TilingConfig) -> Self {
        Self {
            input_dir: overrides.input_dir.or(self.input_dir),
            output_dir: overrides.output_dir.or(self.output_dir),
            tile_size: overrides.tile_size.or(self.tile_size),
            overlap: overrides.overlap.or(self.overlap),
        }
    }

    pub fn into_job(self) -> Result<TilingJob> {
        let input = self
            .input_dir
            .ok_or(TilerError::MissingSetting("input_dir"))?;
        let output = self
            .output_dir
            .ok_or(TilerError::MissingSetting("output_dir"))?;

        TilingJob::new(
            input,
            output,
            self.tile_size.unwrap_or(DEFAULT_TILE_SIZE),
            self.overlap.unwrap_or(DEFAULT_OVERLAP),
        )
    }
}

/// Pixel stride between adjacent tile origins: `floor(tile_size * (1 - overlap))`.
pub fn compute_step(tile_size: u32, overlap: f64) -> Result<u32> {
    if tile_size == 0 {
        return Err(TilerError::InvalidTileSize(tile_size));
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(TilerError::InvalidOverlap(overlap));
    }

    let step = (f64::from(tile_size) * (1.0 - overlap)).floor();
    if step < 1.0 {
        return Err(TilerError::DegenerateStep { tile_size, overlap });
    }
    Ok(step as u32)
}

/// Validated parameters for one tiling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub tile_size: u32,
    pub overlap: f64,
    pub step: u32,
}

impl TilingJob {
    pub fn new(input: PathBuf, output_dir: PathBuf, tile_size: u32, overlap: f64) -> Result<Self> {
        let step = compute_step(tile_size, overlap)?;
        Ok(Self {
            input,
            output_dir,
            tile_size,
            overlap,
            step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_default_overlap() {
        assert_eq!(compute_step(600, 0.2).unwrap(), 480);
        assert_eq!(compute_step(512, 0.2).unwrap(), 409);
        assert_eq!(compute_step(4000, 0.0).unwrap(), 4000);
    }

    #[test]
    fn test_step_rejects_bad_parameters() {
        assert!(matches!(
            compute_step(0, 0.2),
            Err(TilerError::InvalidTileSize(0))
        ));
        assert!(matches!(
            compute_step(512, 1.0),
            Err(TilerError::InvalidOverlap(_))
        ));
        assert!(matches!(
            compute_step(512, -0.1),
            Err(TilerError::InvalidOverlap(_))
        ));
        assert!(matches!(
            compute_step(512, f64::NAN),
            Err(TilerError::InvalidOverlap(_))
        ));
        assert!(matches!(
            compute_step(10, 0.95),
            Err(TilerError::DegenerateStep { .. })
        ));
    }

    #[test]
    fn test_yaml_full() {
        let cfg = TilingConfig::from_yaml_str(
            "input_dir: data/mosaics\noutput_dir: data/tiles\ntile_size: 640\noverlap: 0.25\n",
        )
        .unwrap();
        let job = cfg.into_job().unwrap();
        assert_eq!(job.input, PathBuf::from("data/mosaics"));
        assert_eq!(job.output_dir, PathBuf::from("data/tiles"));
        assert_eq!(job.tile_size, 640);
        assert_eq!(job.step, 480);
    }

    #[test]
    fn test_yaml_defaults() {
        let job = TilingConfig::from_yaml_str("input_dir: in\noutput_dir: out\n")
            .unwrap()
            .into_job()
            .unwrap();
        assert_eq!(job.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(job.overlap, DEFAULT_OVERLAP);
        assert_eq!(job.step, 3200);
    }

    #[test]
    fn test_yaml_unknown_key_rejected() {
        let err = TilingConfig::from_yaml_str("input_dir: in\nbatch: 16\n").unwrap_err();
        assert!(matches!(err, TilerError::Config(_)));
    }

    #[test]
    fn test_yaml_negative_tile_size_rejected() {
        assert!(TilingConfig::from_yaml_str("tile_size: -5\n").is_err());
    }

    #[test]
    fn test_missing_output_dir() {
        let cfg = TilingConfig {
            input_dir: Some("in".into()),
            ..Default::default()
        };
        assert!(matches!(
            cfg.into_job(),
            Err(TilerError::MissingSetting("output_dir"))
        ));
    }

    #[test]
    fn test_merge_overrides_win() {
        let file = TilingConfig {
            input_dir: Some("a".into()),
            output_dir: Some("b".into()),
            tile_size: Some(8192),
            overlap: Some(0.1),
        };
        let cli = TilingConfig {
            tile_size: Some(512),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.input_dir, Some("a".into()));
        assert_eq!(merged.tile_size, Some(512));
        assert_eq!(merged.overlap, Some(0.1));
    }
}
