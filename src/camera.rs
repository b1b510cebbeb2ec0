use crate::drawable::Drawable;
use crate::engine::{CanvasSurface, Point, Rect, Surface, View};
use crate::error::GridlandError;
use crate::resource::{LoadListener, LoadTracker, Loadable, Progress};
use std::rc::Rc;

/// Where the "loaded/total" overlay goes while images are still loading
const PROGRESS_TEXT_POSITION: Point = Point { x: 10.0, y: 20.0 };

/// Owns the drawing surface and decides what gets drawn where.
///
/// ┌──────────────────────── Draw pass ──────────────────────────┐
/// │  clear surface                                              │
/// │    └─► for drawable in to_draw (insertion order = z-order)  │
/// │          └─► drawable.draw(surface, view)                   │
/// │  progress overlay "loaded/total" while still loading        │
/// └─────────────────────────────────────────────────────────────┘
///
/// The camera position is added to every world position, so `move_by`
/// shifts the whole scene by the same delta on screen.
pub struct Camera<S: Surface> {
    surface: S,
    position: Point,
    drawables: Vec<Rc<dyn Drawable>>,
    // updated by update_to_draw, the culling hook
    to_draw: Vec<Rc<dyn Drawable>>,
    tracker: Rc<LoadTracker>,
}

impl Camera<CanvasSurface> {
    /// Binds a camera to the canvas with DOM id `canvas_id`.
    pub fn attach(canvas_id: &str) -> Result<Self, GridlandError> {
        let surface = CanvasSurface::from_canvas_id(canvas_id)?;
        log::info!("camera attached to canvas '{}'", canvas_id);
        Ok(Camera::new(surface))
    }
}

impl<S: Surface> Camera<S> {
    pub fn new(surface: S) -> Self {
        Camera {
            surface,
            position: Point::default(),
            drawables: Vec::new(),
            to_draw: Vec::new(),
            tracker: LoadTracker::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn view(&self) -> View {
        View {
            origin: self.position,
            size: self.surface.size(),
        }
    }

    pub fn drawables(&self) -> &[Rc<dyn Drawable>] {
        &self.drawables
    }

    /// Registers `drawable` on top of everything added before and rolls its
    /// load progress into the camera's.
    pub fn add_drawable(&mut self, drawable: Rc<dyn Drawable>) {
        self.tracker.follow(&*drawable);
        self.drawables.push(drawable);
        self.update_to_draw();
    }

    pub fn draw(&self) {
        let view = self.view();
        self.surface.clear(&Rect::new(Point::default(), view.size));

        for drawable in &self.to_draw {
            drawable.draw(&self.surface, &view);
        }

        let progress = self.tracker.progress();
        if !progress.is_complete() {
            self.surface
                .draw_text(&progress.to_string(), PROGRESS_TEXT_POSITION);
        }
    }

    /// relative move
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.translate(dx, dy);
        self.update_to_draw();
    }

    /// absolute move
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.position = Point { x, y };
        self.update_to_draw();
    }

    /// Rebuilds the draw list from the drawables that report themselves
    /// visible in the current view. No culling beyond that yet.
    pub fn update_to_draw(&mut self) {
        let view = self.view();
        self.to_draw = self
            .drawables
            .iter()
            .filter(|drawable| drawable.is_visible(&view))
            .cloned()
            .collect();
    }

    pub fn loaded_percentage(&self) -> f64 {
        self.tracker.progress().percentage()
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.tracker.progress().is_complete()
    }

    /// Runs `hook` each time a registered drawable finishes loading a resource.
    pub fn on_loaded(&self, hook: impl Fn(u32) + 'static) {
        self.tracker.subscribe(hook);
    }
}

impl<S: Surface> Loadable for Camera<S> {
    fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    fn subscribe(&self, listener: LoadListener) {
        Loadable::subscribe(&*self.tracker, listener);
    }
}
