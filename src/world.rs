use crate::browser::html;
use crate::camera::Camera;
use crate::engine::Surface;
use crate::error::GridlandError;
use crate::image::ImageCache;
use crate::sprite::tile_grid::{DenseGrid, TileGrid, TileGridConfig};
use crate::sprite::{Sprite, SpriteConfig};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A palette entry: tile type name plus its sprite parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NamedSprite {
    pub name: String,
    #[serde(flatten)]
    pub sprite: SpriteConfig,
}

/// Scene description served next to the page, e.g.
///
/// ```json
/// {
///   "canvas": "canvas",
///   "grid": { "size": 32 },
///   "tiles": [
///     { "name": "grass", "src": "tiles.png", "width": 32, "height": 32 },
///     { "name": "water", "src": "tiles.png", "ox": 32, "width": 32, "height": 32 }
///   ],
///   "matrix": { "width": 2, "height": 1, "data": [0, 1] },
///   "sprites": [{ "src": "agent.png", "x": 32 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_canvas")]
    pub canvas: String,
    #[serde(default)]
    pub grid: TileGridConfig,
    pub tiles: Vec<NamedSprite>,
    pub matrix: DenseGrid,
    /// free standing sprites drawn above the grid, in order
    #[serde(default)]
    pub sprites: Vec<SpriteConfig>,
}

fn default_canvas() -> String {
    html::CANVAS_ID.to_string()
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, GridlandError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Handles to everything a world registered on its camera
pub struct World {
    pub grid: Rc<TileGrid>,
    pub sprites: Vec<Rc<Sprite>>,
}

impl World {
    /// Builds palette, grid and sprites and registers them on `camera`,
    /// grid first so sprites are drawn on top. On error the camera is left
    /// untouched.
    pub fn build<S: Surface>(
        config: &WorldConfig,
        cache: &ImageCache,
        camera: &mut Camera<S>,
    ) -> Result<World, GridlandError> {
        let palette = config
            .tiles
            .iter()
            .map(|tile| Ok((tile.name.clone(), Rc::new(Sprite::new(cache, &tile.sprite)?))))
            .collect::<Result<Vec<_>, GridlandError>>()?;

        let grid = TileGrid::new(&config.grid, palette)?;
        grid.load_from_dense_matrix(config.matrix.clone())?;
        let grid = Rc::new(grid);

        let sprites = config
            .sprites
            .iter()
            .map(|sprite| Sprite::new(cache, sprite).map(Rc::new))
            .collect::<Result<Vec<_>, GridlandError>>()?;

        // nothing reaches the camera until every part was built
        camera.add_drawable(grid.clone());
        for sprite in &sprites {
            camera.add_drawable(sprite.clone());
        }

        log::info!(
            "world built: {}x{} grid, {} tile types, {} sprites",
            config.matrix.width,
            config.matrix.height,
            config.tiles.len(),
            sprites.len()
        );
        Ok(World { grid, sprites })
    }
}
