use crate::engine::{Point, Surface, View};
use crate::resource::Loadable;

/// Every drawable lives in world space and is, visually, a rectangle.
///
/// Movement convention for drawables and the camera alike:
/// - `move_by` : relative delta
/// - `move_to` : absolute position
pub trait Drawable: Loadable {
    fn position(&self) -> Point;
    fn set_position(&self, position: Point);

    /// Paints into `surface`, translating world positions by `view.origin`.
    fn draw(&self, surface: &dyn Surface, view: &View);

    /// Asked by the camera when it rebuilds its draw list. Culling hook,
    /// everything is visible by default.
    fn is_visible(&self, _view: &View) -> bool {
        true
    }

    fn move_by(&self, dx: f64, dy: f64) {
        self.set_position(self.position().translate(dx, dy));
    }

    fn move_to(&self, x: f64, y: f64) {
        self.set_position(Point { x, y });
    }
}
