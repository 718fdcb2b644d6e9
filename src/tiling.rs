use log::debug;

/// Pixel bounds of one tile inside its parent raster.
///
/// Ranges are half-open: the tile covers columns `left..right` and rows
/// `upper..lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub row: u32,
    pub col: u32,
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

impl TileBounds {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.lower - self.upper
    }
}

/// Output name of a tile, without extension.
pub fn tile_name(base_name: &str, row: u32, col: u32) -> String {
    format!("{}_Tile_{}_{}", base_name, row, col)
}

/// Number of tiles needed along one axis.
pub fn tiles_along(extent: u32, tile_size: u32, step: u32) -> u32 {
    if extent <= tile_size {
        1
    } else {
        (extent - tile_size).div_ceil(step) + 1
    }
}

/// Start/end of the tile at `index` along one axis, shifted back inside the
/// raster when it would run past `extent`.
fn axis_bounds(index: u32, tile_size: u32, step: u32, extent: u32) -> Option<(u32, u32)> {
    let start = index.checked_mul(step)?;
    let end = start.saturating_add(tile_size);

    let (start, end) = if end > extent {
        match extent.checked_sub(tile_size) {
            Some(shifted) => (shifted, extent),
            // Raster shorter than one tile: only the first tile survives, clipped
            None if start == 0 => (0, extent),
            None => return None,
        }
    } else {
        (start, end)
    };

    (start < end).then_some((start, end))
}

/// Pixel bounds of tile `(row, col)` under the edge clamp policy.
///
/// Tiles that would run past the right or bottom edge are shifted back so
/// they end on the edge. Returns `None` when no valid region exists, which
/// happens for an empty raster or when a shifted bound would go negative.
pub fn compute_tile_bounds(
    row: u32,
    col: u32,
    tile_size: u32,
    step: u32,
    width: u32,
    height: u32,
) -> Option<TileBounds> {
    let (left, right) = axis_bounds(col, tile_size, step, width)?;
    let (upper, lower) = axis_bounds(row, tile_size, step, height)?;

    Some(TileBounds {
        row,
        col,
        left,
        upper,
        right,
        lower,
    })
}

pub struct TileGrid {
    raster_width: u32,
    raster_height: u32,
    tile_size: u32,
    step: u32,
    pub cols: u32,
    pub rows: u32,
    pub total_tiles: usize,
}

impl TileGrid {
    pub fn new(raster_width: u32, raster_height: u32, tile_size: u32, step: u32) -> Self {
        let cols = tiles_along(raster_width, tile_size, step);
        let rows = tiles_along(raster_height, tile_size, step);
        let total_tiles = cols as usize * rows as usize;

        debug!(
            "TileGrid: {}x{} raster, tile_size={}, step={} → {}x{} tiles ({} total)",
            raster_width, raster_height, tile_size, step, cols, rows, total_tiles
        );

        Self {
            raster_width,
            raster_height,
            tile_size,
            step,
            cols,
            rows,
            total_tiles,
        }
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator::new(self)
    }

    /// Bounds of the tile at a row-major linear index.
    pub fn get_tile_bounds(&self, tile_idx: usize) -> (u32, u32, Option<TileBounds>) {
        let row = (tile_idx / self.cols as usize) as u32;
        let col = (tile_idx % self.cols as usize) as u32;

        let bounds = compute_tile_bounds(
            row,
            col,
            self.tile_size,
            self.step,
            self.raster_width,
            self.raster_height,
        );

        if let Some(b) = &bounds {
            debug!(
                "Tile {} ({}, {}): [{}-{}, {}-{}]",
                tile_idx, row, col, b.left, b.right, b.upper, b.lower
            );
        }

        (row, col, bounds)
    }
}

pub struct TileIterator<'a> {
    grid: &'a TileGrid,
    current_idx: usize,
}

impl<'a> TileIterator<'a> {
    fn new(grid: &'a TileGrid) -> Self {
        Self {
            grid,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = (u32, u32, Option<TileBounds>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx < self.grid.total_tiles {
            let item = self.grid.get_tile_bounds(self.current_idx);
            self.current_idx += 1;
            Some(item)
        } else {
            None
        }
    }
}
