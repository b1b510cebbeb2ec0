// ==================== Imports ====================
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod camera;
pub mod drawable;
pub mod engine;
pub mod error;
pub mod image;
pub mod resource;
pub mod sprite;
pub mod world;

#[cfg(test)]
mod testing;

pub use camera::Camera;
pub use drawable::Drawable;
pub use engine::{CanvasSurface, HtmlImageLoader, Point, Rect, RenderLoop, Size, Surface, View};
pub use error::GridlandError;
pub use image::{CachedImage, ImageCache, ImageLoader, ImageState};
pub use resource::{LoadTracker, Loadable, Progress};
pub use sprite::tile_grid::{DenseGrid, TileGrid, TileGridConfig};
pub use sprite::{Sprite, SpriteConfig};
pub use world::{World, WorldConfig};

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook and console logger
/// - fetches the world description
/// - builds the scene and starts drawing
#[wasm_bindgen]
pub fn main_js() -> std::result::Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    browser::init_logger(log::Level::Info)
        .map_err(|err| JsValue::from_str(&format!("{:#}", err)))?;

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = start().await {
            log::error!("could not start gridland: {:#}", err);
        }
    });

    Ok(())
}

async fn start() -> Result<()> {
    let config: WorldConfig = browser::fetch_json(browser::html::WORLD_PATH)
        .await
        .with_context(|| format!("Failed to load world from : {}", browser::html::WORLD_PATH))?;

    let cache = ImageCache::new(HtmlImageLoader);
    let mut camera = Camera::attach(&config.canvas)?;
    World::build(&config, &cache, &mut camera)?;

    RenderLoop::start(Rc::new(RefCell::new(camera)))
}
