// TABLE:
// ┌───────────────────┬──────────────────────────────────────────────────────┐
// │ Code File         │ Role                                                 │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ sprite/mod.rs     │ Sprite : one cached image region at a world position │
// │ sprite/tile_grid  │ TileGrid : palette sprites stamped over a 2d grid    │
// └───────────────────┴──────────────────────────────────────────────────────┘
pub mod tile_grid;

use crate::drawable::Drawable;
use crate::engine::{Point, Rect, Size, Surface, View};
use crate::error::GridlandError;
use crate::image::{CachedImage, ImageCache};
use crate::resource::{LoadListener, LoadTracker, Loadable, Progress};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Sprite parameters as they appear in a world description.
/// Missing fields fall back to the defaults:
/// - position and crop offset : (0, 0)
/// - width / height           : natural image size once known
/// - visible                  : true
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub ox: f64,
    pub oy: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub visible: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        SpriteConfig {
            src: String::new(),
            x: 0.0,
            y: 0.0,
            ox: 0.0,
            oy: 0.0,
            width: None,
            height: None,
            visible: true,
        }
    }
}

impl SpriteConfig {
    pub fn new(src: impl Into<String>) -> Self {
        SpriteConfig {
            src: src.into(),
            ..SpriteConfig::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// crop rectangle inside the source image
    pub fn cropped(mut self, ox: f64, oy: f64, width: f64, height: f64) -> Self {
        self.ox = ox;
        self.oy = oy;
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// A drawable backed by exactly one cached image.
///
/// `total` is always 1 and `loaded` flips from 0 to 1 exactly once, when
/// the backing image reports loaded (during construction if it already
/// was).
pub struct Sprite {
    image: Rc<CachedImage>,
    position: Cell<Point>,
    offset: Point,
    width: Option<f64>,
    height: Option<f64>,
    visible: Cell<bool>,
    tracker: Rc<LoadTracker>,
}

impl Sprite {
    pub fn new(cache: &ImageCache, config: &SpriteConfig) -> Result<Self, GridlandError> {
        if config.src.trim().is_empty() {
            return Err(GridlandError::configuration("sprite needs an image source"));
        }

        let tracker = LoadTracker::new();
        tracker.add_total(1);
        let sprite = Sprite {
            image: cache.get(&config.src),
            position: Cell::new(Point::new(config.x, config.y)),
            offset: Point::new(config.ox, config.oy),
            width: config.width,
            height: config.height,
            visible: Cell::new(config.visible),
            tracker,
        };

        // weak so a dropped sprite is not kept alive by a pending image
        let tracker: Weak<LoadTracker> = Rc::downgrade(&sprite.tracker);
        sprite.image.when_loaded(move |_| {
            if let Some(tracker) = tracker.upgrade() {
                tracker.add_loaded(1);
            }
        });

        Ok(sprite)
    }

    pub fn image(&self) -> &Rc<CachedImage> {
        &self.image
    }

    pub fn is_loaded(&self) -> bool {
        self.tracker.progress().is_complete()
    }

    pub fn is_shown(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    /// Configured size, each missing side taken from the natural image size.
    /// `None` until that natural size is needed and still unknown.
    pub fn size(&self) -> Option<Size> {
        let natural = self.image.natural_size();
        Some(Size {
            width: self.width.or(natural.map(|size| size.width))?,
            height: self.height.or(natural.map(|size| size.height))?,
        })
    }

    /// Runs `hook` when this sprite finishes loading.
    pub fn on_loaded(&self, hook: impl Fn(u32) + 'static) {
        self.tracker.subscribe(hook);
    }

    /// Runs `hook` once the shared backing image has loaded, after every
    /// sprite using that image finished its own transition.
    pub fn on_image_loaded(&self, hook: impl FnOnce(&CachedImage) + 'static) {
        self.image.on_loaded(hook);
    }

    /// Paints the crop region with its top left corner at `position`.
    /// Hidden or not yet loaded sprites are skipped.
    pub fn draw_at(&self, surface: &dyn Surface, view: &View, position: Point) {
        if !self.visible.get() || !self.is_loaded() {
            return;
        }
        let Some(size) = self.size() else {
            return;
        };
        let frame = Rect::new(self.offset, size);
        let destination = Rect::new(view.to_screen(position), size);
        surface.draw_image(&self.image, &frame, &destination);
    }
}

impl Loadable for Sprite {
    fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    fn subscribe(&self, listener: LoadListener) {
        Loadable::subscribe(&*self.tracker, listener);
    }
}

impl Drawable for Sprite {
    fn position(&self) -> Point {
        self.position.get()
    }

    fn set_position(&self, position: Point) {
        self.position.set(position);
    }

    fn draw(&self, surface: &dyn Surface, view: &View) {
        self.draw_at(surface, view, self.position.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawCall, ManualLoader, RecordingSurface};

    const AGENT: &str = "sprites/agent.png";

    fn setup() -> (ManualLoader, ImageCache) {
        let loader = ManualLoader::default();
        let cache = ImageCache::new(loader.clone());
        (loader, cache)
    }

    #[test]
    fn empty_source_is_a_configuration_error() {
        let (_, cache) = setup();
        let result = Sprite::new(&cache, &SpriteConfig::default());
        assert!(matches!(result, Err(GridlandError::Configuration(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn loads_once_when_image_completes() {
        let (loader, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();
        assert_eq!(sprite.progress(), Progress { loaded: 0, total: 1 });

        loader.complete(AGENT, Size::new(16.0, 16.0));
        loader.complete(AGENT, Size::new(16.0, 16.0));

        assert_eq!(sprite.progress(), Progress { loaded: 1, total: 1 });
    }

    #[test]
    fn loaded_image_completes_during_construction() {
        let (loader, cache) = setup();
        let _first = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();
        loader.complete(AGENT, Size::new(16.0, 16.0));

        let second = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();
        assert!(second.is_loaded());
        assert_eq!(loader.request_count(), 1);
    }

    #[test]
    fn failed_image_leaves_sprite_unloaded() {
        let (loader, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();

        loader.fail(AGENT);
        loader.complete(AGENT, Size::new(16.0, 16.0));

        assert_eq!(sprite.progress(), Progress { loaded: 0, total: 1 });
        assert!(sprite.size().is_none());
    }

    #[test]
    fn hook_fires_exactly_once() {
        let (loader, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        sprite.on_loaded(move |amount| counter.set(counter.get() + amount));

        loader.complete(AGENT, Size::new(16.0, 16.0));
        loader.complete(AGENT, Size::new(16.0, 16.0));

        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn every_image_hook_fires_for_shared_image() {
        let (loader, cache) = setup();
        let fired = Rc::new(Cell::new(0));
        let sprites: Vec<Sprite> = (0..2)
            .map(|_| Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap())
            .collect();
        for sprite in &sprites {
            let counter = Rc::clone(&fired);
            let loaded = sprites.iter().map(|s| Rc::clone(&s.tracker)).collect::<Vec<_>>();
            sprite.on_image_loaded(move |_| {
                // both sprite transitions already ran
                assert!(loaded.iter().all(|t| t.progress().is_complete()));
                counter.set(counter.get() + 1);
            });
        }

        loader.complete(AGENT, Size::new(16.0, 16.0));

        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn draw_is_skipped_until_loaded() {
        let (loader, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT).at(10.0, 20.0)).unwrap();
        let surface = RecordingSurface::new(Size::new(100.0, 100.0));
        let view = View {
            origin: Point::new(5.0, 5.0),
            size: surface.size(),
        };

        sprite.draw(&surface, &view);
        assert!(surface.calls().is_empty());

        loader.complete(AGENT, Size::new(16.0, 24.0));
        sprite.draw(&surface, &view);

        assert_eq!(
            surface.calls(),
            vec![DrawCall::Image {
                source: AGENT.to_string(),
                frame: Rect::new(Point::new(0.0, 0.0), Size::new(16.0, 24.0)),
                destination: Rect::new(Point::new(15.0, 25.0), Size::new(16.0, 24.0)),
            }]
        );
    }

    #[test]
    fn crop_rectangle_overrides_natural_size() {
        let (loader, cache) = setup();
        let config = SpriteConfig::new(AGENT).cropped(32.0, 0.0, 16.0, 16.0);
        let sprite = Sprite::new(&cache, &config).unwrap();
        loader.complete(AGENT, Size::new(64.0, 16.0));
        let surface = RecordingSurface::new(Size::new(100.0, 100.0));

        sprite.draw(&surface, &View::default());

        assert_eq!(
            surface.calls(),
            vec![DrawCall::Image {
                source: AGENT.to_string(),
                frame: Rect::new(Point::new(32.0, 0.0), Size::new(16.0, 16.0)),
                destination: Rect::new(Point::new(0.0, 0.0), Size::new(16.0, 16.0)),
            }]
        );
    }

    #[test]
    fn hidden_sprite_draws_nothing() {
        let (loader, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT)).unwrap();
        loader.complete(AGENT, Size::new(16.0, 16.0));
        assert!(sprite.is_shown());
        sprite.set_visible(false);
        let surface = RecordingSurface::new(Size::new(100.0, 100.0));

        sprite.draw(&surface, &View::default());

        assert!(!sprite.is_shown());
        assert!(surface.calls().is_empty());

        sprite.set_visible(true);
        sprite.draw(&surface, &View::default());
        assert_eq!(surface.placements(AGENT), vec![Point::default()]);
    }

    #[test]
    fn move_by_is_relative_and_move_to_absolute() {
        let (_, cache) = setup();
        let sprite = Sprite::new(&cache, &SpriteConfig::new(AGENT).at(1.0, 1.0)).unwrap();

        sprite.move_by(2.0, 3.0);
        assert_eq!(sprite.position(), Point::new(3.0, 4.0));

        sprite.move_to(-1.0, 0.0);
        assert_eq!(sprite.position(), Point::new(-1.0, 0.0));
    }

    #[test]
    fn config_defaults_from_json() {
        let config: SpriteConfig = serde_json::from_str(r#"{"src": "a.png", "x": 4}"#).unwrap();
        assert_eq!(config, SpriteConfig::new("a.png").at(4.0, 0.0));
        assert!(config.visible);
    }
}
