use crate::browser;
use crate::camera::Camera;
use crate::error::GridlandError;
use crate::image::{CachedImage, ImageLoader};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

// ==================== Geometry ====================
/// World space position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }
}

/// What a drawable needs to know about the camera for one draw pass
/// - origin : translation added to every world position
/// - size   : viewport dimensions of the surface
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct View {
    pub origin: Point,
    pub size: Size,
}

impl View {
    pub fn to_screen(&self, world: Point) -> Point {
        world.translate(self.origin.x, self.origin.y)
    }
}

// ==================== Surface ====================
/// 2d drawing target. The core never creates or owns one, it only draws
/// into whatever the application hands the camera.
pub trait Surface {
    fn size(&self) -> Size;
    fn clear(&self, rect: &Rect);
    /// Paints the `frame` region of `image` into `destination`.
    fn draw_image(&self, image: &CachedImage, frame: &Rect, destination: &Rect);
    fn draw_text(&self, text: &str, position: Point);
}

/// Surface backed by an html canvas and its 2d context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Binds to the canvas with DOM id `canvas_id`.
    /// # Returns
    /// * `Err(GridlandError::Configuration)` - when the element is missing,
    ///   is not a canvas, or the browser gives no 2d context
    pub fn from_canvas_id(canvas_id: &str) -> Result<Self, GridlandError> {
        let canvas = browser::canvas(canvas_id)
            .map_err(|err| GridlandError::configuration(format!("{:#}", err)))?;
        let context = browser::context_2d(&canvas).map_err(|err| {
            GridlandError::configuration(format!("canvas does not support 2d drawing: {:#}", err))
        })?;
        Ok(CanvasSurface { canvas, context })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Size {
        Size {
            width: self.canvas.width().into(),
            height: self.canvas.height().into(),
        }
    }

    fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    fn draw_image(&self, image: &CachedImage, frame: &Rect, destination: &Rect) {
        let Some(element) = image.handle::<HtmlImageElement>() else {
            log::debug!("no image element attached to {}", image.source());
            return;
        };
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &element,
                frame.x(),
                frame.y(),
                frame.width(),
                frame.height(),
                destination.x(),
                destination.y(),
                destination.width(),
                destination.height(),
            )
        {
            log::error!("drawing {} failed: {:#?}", image.source(), err);
        }
    }

    fn draw_text(&self, text: &str, position: Point) {
        if let Err(err) = self.context.fill_text(text, position.x, position.y) {
            log::error!("drawing text failed: {:#?}", err);
        }
    }
}

// ==================== Image loading ====================
/// Fetches images through `HtmlImageElement`; the element becomes the
/// cached image's handle so `CanvasSurface` can paint it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
    fn load(&self, image: &Rc<CachedImage>) {
        if let Err(err) = start_image_load(image) {
            image.fail(&format!("{:#}", err));
        }
    }
}

/// Wires onload/onerror to the cached image and kicks off the request
/// # Arguments
/// * `image` - cache entry whose source is fetched
/// # Returns
/// * `Ok(())` - request started, completion arrives through the callbacks
/// * `Err` - element could not be created
fn start_image_load(image: &Rc<CachedImage>) -> Result<()> {
    let element = Rc::new(browser::new_image()?);

    let loaded_image = Rc::clone(image);
    let loaded_element = Rc::clone(&element);
    let success_callback = Closure::once(move || {
        loaded_image.finish(Size {
            width: loaded_element.natural_width().into(),
            height: loaded_element.natural_height().into(),
        });
    });

    let failed_image = Rc::clone(image);
    let error_callback = Closure::once(move |err: JsValue| {
        failed_image.fail(&format!("{:#?}", err));
    });

    // both closures take the argument lists onload/onerror pass in
    element.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    element.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.attach_handle(Rc::clone(&element));
    element.set_src(image.source());

    // keep callbacks alive until the image loads or errors
    success_callback.forget();
    error_callback.forget();

    Ok(())
}

// ==================== Render loop ====================
// the frame callback reschedules itself, so it has to reach its own slot;
// wasm runs the loop on one thread, Rc<RefCell> is enough
type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

/// Redraws a camera on every animation frame
pub struct RenderLoop;

impl RenderLoop {
    pub fn start<S: Surface + 'static>(camera: Rc<RefCell<Camera<S>>>) -> Result<()> {
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |_perf: f64| {
            camera.borrow().draw();
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    log::error!("render loop stopped: {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("RenderLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}
