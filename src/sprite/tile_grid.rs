use crate::drawable::Drawable;
use crate::engine::{Point, Surface, View};
use crate::error::GridlandError;
use crate::resource::{LoadListener, LoadTracker, Loadable, Progress};
use crate::sprite::Sprite;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Grid placement parameters. `size` is the side of one square tile in
/// pixels; the grid dimensions come from the loaded matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TileGridConfig {
    pub size: f64,
    pub x: f64,
    pub y: f64,
}

/// Dense row-major grid: `data[row * width + col]` is a palette index.
/// Any value outside the palette (negative included) marks an empty cell.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DenseGrid {
    pub width: u32,
    pub height: u32,
    pub data: Vec<i64>,
}

impl DenseGrid {
    pub fn validate(&self) -> Result<(), GridlandError> {
        // exact form of `data.len() / width == height`
        let cells = u64::from(self.width) * u64::from(self.height);
        if self.width == 0 || cells != self.data.len() as u64 {
            return Err(GridlandError::InvalidGrid {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, col: u32, row: u32) -> Option<i64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let index = u64::from(row) * u64::from(self.width) + u64::from(col);
        let index = usize::try_from(index).ok()?;
        self.data.get(index).copied()
    }
}

/// Palette tiles stamped over a 2d grid.
///
/// Palette sprites are shared visual descriptors: drawing a cell never
/// moves them, the cell position is handed to [`Sprite::draw_at`]. Load
/// progress is the sum over the palette.
pub struct TileGrid {
    position: Cell<Point>,
    size: f64,
    palette: Vec<(String, Rc<Sprite>)>,
    cells: RefCell<DenseGrid>,
    tracker: Rc<LoadTracker>,
}

impl TileGrid {
    /// # Arguments
    /// * `config` - placement and tile size
    /// * `palette` - named tile types, indexed in the given order
    /// # Returns
    /// * `Err(GridlandError::Configuration)` - when the palette is empty
    pub fn new(
        config: &TileGridConfig,
        palette: impl IntoIterator<Item = (String, Rc<Sprite>)>,
    ) -> Result<Self, GridlandError> {
        let palette: Vec<(String, Rc<Sprite>)> = palette.into_iter().collect();
        if palette.is_empty() {
            return Err(GridlandError::configuration("tile grid needs a tile palette"));
        }

        let tracker = LoadTracker::new();
        for (_, sprite) in &palette {
            tracker.follow(&**sprite);
        }

        Ok(TileGrid {
            position: Cell::new(Point::new(config.x, config.y)),
            size: config.size,
            palette,
            // empty until a matrix is loaded
            cells: RefCell::new(DenseGrid::default()),
            tracker,
        })
    }

    /// Replaces the grid contents. On error the previous grid is kept.
    pub fn load_from_dense_matrix(&self, grid: DenseGrid) -> Result<(), GridlandError> {
        grid.validate()?;
        log::debug!("tile grid loaded {}x{} cells", grid.width, grid.height);
        *self.cells.borrow_mut() = grid;
        Ok(())
    }

    /// Parses `{"width": w, "height": h, "data": [...]}` and loads it.
    pub fn load_from_json(&self, json: &str) -> Result<(), GridlandError> {
        let grid: DenseGrid = serde_json::from_str(json)?;
        self.load_from_dense_matrix(grid)
    }

    /// (width, height) in tiles
    pub fn dimensions(&self) -> (u32, u32) {
        let cells = self.cells.borrow();
        (cells.width, cells.height)
    }

    pub fn tile_size(&self) -> f64 {
        self.size
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<i64> {
        self.cells.borrow().get(col, row)
    }

    pub fn palette_index(&self, name: &str) -> Option<usize> {
        self.palette.iter().position(|(tile, _)| tile == name)
    }

    pub fn tile(&self, index: i64) -> Option<&Rc<Sprite>> {
        let index = usize::try_from(index).ok()?;
        self.palette.get(index).map(|(_, sprite)| sprite)
    }

    /// Runs `hook` each time one of the palette images finishes loading.
    pub fn on_loaded(&self, hook: impl Fn(u32) + 'static) {
        self.tracker.subscribe(hook);
    }
}

impl Loadable for TileGrid {
    fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    fn subscribe(&self, listener: LoadListener) {
        Loadable::subscribe(&*self.tracker, listener);
    }
}

impl Drawable for TileGrid {
    fn position(&self) -> Point {
        self.position.get()
    }

    fn set_position(&self, position: Point) {
        self.position.set(position);
    }

    fn draw(&self, surface: &dyn Surface, view: &View) {
        let cells = self.cells.borrow();
        let origin = self.position.get();
        for row in 0..cells.height {
            for col in 0..cells.width {
                let Some(tile) = cells.get(col, row).and_then(|index| self.tile(index)) else {
                    continue;
                };
                let cell = origin.translate(f64::from(col) * self.size, f64::from(row) * self.size);
                tile.draw_at(surface, view, cell);
            }
        }
    }
}
