use crate::error::{Result, TilerError};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageReader};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const JPEG_QUALITY: u8 = 95;

pub const PROJECTION_EXTENSION: &str = "prj";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
    Tiff,
}

impl RasterFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// World file extensions to look for, most common first.
    pub fn world_file_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpw", "jgw"],
            Self::Png => &["pgw"],
            Self::Tiff => &["tfw"],
        }
    }
}

/// A raster found on disk together with the names of its sidecar files.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    pub path: PathBuf,
    pub base_name: String,
    pub extension: String,
    pub format: RasterFormat,
}

impl RasterSource {
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = RasterFormat::from_path(path)?;
        let base_name = path.file_stem()?.to_string_lossy().into_owned();
        let extension = path.extension()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            base_name,
            extension,
            format,
        })
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        self.path.with_file_name(format!("{}.{}", self.base_name, extension))
    }

    /// Path of the world file next to this raster.
    pub fn locate_world_file(&self) -> Result<PathBuf> {
        let candidates = self.format.world_file_extensions();
        candidates
            .iter()
            .map(|ext| self.sibling(ext))
            .find(|p| p.is_file())
            .ok_or_else(|| TilerError::MissingWorldFile(self.sibling(candidates[0])))
    }

    /// Path of the projection file, if one exists.
    pub fn projection_file(&self) -> Option<PathBuf> {
        let path = self.sibling(PROJECTION_EXTENSION);
        path.is_file().then_some(path)
    }
}

/// Collect the rasters to tile. `input` may be a single raster or a
/// directory; directory entries are returned sorted by path.
pub fn discover_rasters(input: &Path) -> Result<Vec<RasterSource>> {
    if !input.exists() {
        return Err(TilerError::InputNotFound(input.to_path_buf()));
    }

    if input.is_file() {
        let source = RasterSource::from_path(input)
            .ok_or_else(|| TilerError::UnsupportedRaster(input.to_path_buf()))?;
        return Ok(vec![source]);
    }

    let mut rasters = Vec::new();
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(source) = RasterSource::from_path(&path) {
            rasters.push(source);
        }
    }

    if rasters.is_empty() {
        return Err(TilerError::NoInputRasters(input.to_path_buf()));
    }

    rasters.sort_by(|a, b| a.path.cmp(&b.path));

    // Tiles are named after the base name, so a second raster with the same
    // stem would overwrite the first one's tiles and share its .prj
    let mut seen = HashSet::new();
    rasters.retain(|r| {
        let first = seen.insert(r.base_name.clone());
        if !first {
            warn!(
                "Skipping {}: another raster already uses base name '{}'",
                r.path.display(),
                r.base_name
            );
        }
        first
    });

    info!("Found {} rasters in {}", rasters.len(), input.display());
    Ok(rasters)
}

/// Decode a raster fully into memory. Decoder size limits are lifted since
/// mosaics are routinely larger than the defaults allow.
pub fn open_raster(path: &Path) -> Result<DynamicImage> {
    let decode = || -> image::ImageResult<DynamicImage> {
        let mut reader = ImageReader::open(path)?.with_guessed_format()?;
        reader.no_limits();
        reader.decode()
    };

    decode().map_err(|source| TilerError::RasterOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a tile image. JPEG output uses a fixed quality and drops alpha;
/// other formats are encoded from the path's extension.
pub fn save_tile_image(tile: &DynamicImage, format: RasterFormat, path: &Path) -> Result<()> {
    match format {
        RasterFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            match tile.color() {
                ColorType::L8 | ColorType::Rgb8 => tile.write_with_encoder(encoder)?,
                ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                    DynamicImage::ImageLuma8(tile.to_luma8()).write_with_encoder(encoder)?
                }
                _ => DynamicImage::ImageRgb8(tile.to_rgb8()).write_with_encoder(encoder)?,
            }
            writer.flush()?;
        }
        RasterFormat::Png | RasterFormat::Tiff => tile.save(path)?,
    }

    debug!("Wrote tile image {}", path.display());
    Ok(())
}

pub fn copy_projection(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            RasterFormat::from_path(Path::new("a/b.JPG")),
            Some(RasterFormat::Jpeg)
        );
        assert_eq!(
            RasterFormat::from_path(Path::new("b.tiff")),
            Some(RasterFormat::Tiff)
        );
        assert_eq!(RasterFormat::from_path(Path::new("b.jpw")), None);
        assert_eq!(RasterFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "a.jpw");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let rasters = discover_rasters(dir.path()).unwrap();
        let names: Vec<_> = rasters.iter().map(|r| r.base_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_discover_skips_duplicate_base_names() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.png");
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.tif");

        let rasters = discover_rasters(dir.path()).unwrap();
        let paths: Vec<_> = rasters.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![dir.path().join("a.jpg"), dir.path().join("b.tif")]);
    }

    #[test]
    fn test_discover_empty_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpw");
        assert!(matches!(
            discover_rasters(dir.path()),
            Err(TilerError::NoInputRasters(_))
        ));
    }

    #[test]
    fn test_discover_single_file() {
        let dir = TempDir::new().unwrap();
        let path = touch(dir.path(), "mosaic.png");
        let rasters = discover_rasters(&path).unwrap();
        assert_eq!(rasters.len(), 1);
        assert_eq!(rasters[0].format, RasterFormat::Png);

        let txt = touch(dir.path(), "mosaic.txt");
        assert!(matches!(
            discover_rasters(&txt),
            Err(TilerError::UnsupportedRaster(_))
        ));
    }

    #[test]
    fn test_discover_missing_input() {
        assert!(matches!(
            discover_rasters(Path::new("/nonexistent/mosaics")),
            Err(TilerError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_world_file_fallback_extension() {
        let dir = TempDir::new().unwrap();
        let raster = RasterSource::from_path(&touch(dir.path(), "m.jpeg")).unwrap();
        assert!(matches!(
            raster.locate_world_file(),
            Err(TilerError::MissingWorldFile(p)) if p.ends_with("m.jpw")
        ));

        touch(dir.path(), "m.jgw");
        assert_eq!(raster.locate_world_file().unwrap(), dir.path().join("m.jgw"));

        touch(dir.path(), "m.jpw");
        assert_eq!(raster.locate_world_file().unwrap(), dir.path().join("m.jpw"));
    }

    #[test]
    fn test_projection_file_optional() {
        let dir = TempDir::new().unwrap();
        let raster = RasterSource::from_path(&touch(dir.path(), "m.tif")).unwrap();
        assert_eq!(raster.projection_file(), None);
        touch(dir.path(), "m.prj");
        assert_eq!(raster.projection_file(), Some(dir.path().join("m.prj")));
    }

    #[test]
    fn test_open_raster_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            open_raster(&path),
            Err(TilerError::RasterOpen { .. })
        ));
    }

    #[test]
    fn test_save_jpeg_drops_alpha() {
        let dir = TempDir::new().unwrap();
        let tile = DynamicImage::new_rgba8(16, 8);
        let path = dir.path().join("t.jpg");
        save_tile_image(&tile, RasterFormat::Jpeg, &path).unwrap();

        let reread = open_raster(&path).unwrap();
        assert_eq!((reread.width(), reread.height()), (16, 8));
    }
}
