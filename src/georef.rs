use crate::error::{Result, TilerError};
use log::debug;
use std::fs;
use std::path::Path;

/// Affine pixel-to-world transform as stored in an ESRI world file.
///
/// Field order matches the six lines of the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFile {
    pub x_scale: f64,
    pub y_skew: f64,
    pub x_skew: f64,
    pub y_scale: f64,
    pub x_origin: f64,
    pub y_origin: f64,
}

impl WorldFile {
    /// Parse world file text. Only the first six lines are read; anything
    /// after them is ignored.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < 6 {
            return Err(TilerError::IncompleteWorldFile {
                path: path.to_path_buf(),
                lines: lines.len(),
            });
        }

        let mut values = [0.0f64; 6];
        for (i, (slot, line)) in values.iter_mut().zip(&lines).enumerate() {
            let trimmed = line.trim();
            *slot = trimmed
                .parse::<f64>()
                .map_err(|_| TilerError::InvalidWorldFileValue {
                    path: path.to_path_buf(),
                    line: i + 1,
                    value: trimmed.to_string(),
                })?;
        }

        let [x_scale, y_skew, x_skew, y_scale, x_origin, y_origin] = values;
        Ok(Self {
            x_scale,
            y_skew,
            x_skew,
            y_scale,
            x_origin,
            y_origin,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TilerError::MissingWorldFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let world = Self::parse(&text, path)?;
        debug!("World file {}: {:?}", path.display(), world);
        Ok(world)
    }

    /// Georeference of a sub-image whose top-left pixel sits at
    /// `(left, upper)` in this image. Scale and skew carry over unchanged.
    pub fn translated(&self, left: u32, upper: u32) -> Self {
        Self {
            x_origin: self.x_origin + f64::from(left) * self.x_scale,
            y_origin: self.y_origin + f64::from(upper) * self.y_scale,
            ..*self
        }
    }

    /// Six-line file body in the standard parameter order.
    pub fn to_file_string(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.x_scale, self.y_skew, self.x_skew, self.y_scale, self.x_origin, self.y_origin
        )
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_file_string())?;
        Ok(())
    }
}
