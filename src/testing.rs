//! Native stand-ins for the browser: a surface that records draw calls and
//! an image loader completed by hand.

use crate::engine::{Point, Rect, Size, Surface};
use crate::image::{CachedImage, ImageLoader};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Rect),
    Image {
        source: String,
        frame: Rect,
        destination: Rect,
    },
    Text {
        text: String,
        position: Point,
    },
}

pub struct RecordingSurface {
    size: Size,
    calls: RefCell<Vec<DrawCall>>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        RecordingSurface {
            size,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.borrow().clone()
    }

    /// destinations of every image drawn from `source`
    pub fn placements(&self, source: &str) -> Vec<Point> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                DrawCall::Image {
                    source: drawn,
                    destination,
                    ..
                } if drawn == source => Some(destination.position),
                _ => None,
            })
            .collect()
    }

    pub fn reset(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&self, rect: &Rect) {
        self.calls.borrow_mut().push(DrawCall::Clear(*rect));
    }

    fn draw_image(&self, image: &CachedImage, frame: &Rect, destination: &Rect) {
        self.calls.borrow_mut().push(DrawCall::Image {
            source: image.source().to_string(),
            frame: *frame,
            destination: *destination,
        });
    }

    fn draw_text(&self, text: &str, position: Point) {
        self.calls.borrow_mut().push(DrawCall::Text {
            text: text.to_string(),
            position,
        });
    }
}

/// Records every fetch request; tests decide when each one completes.
#[derive(Clone, Default)]
pub struct ManualLoader {
    requests: Rc<RefCell<Vec<Rc<CachedImage>>>>,
}

impl ManualLoader {
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn complete(&self, source: &str, size: Size) {
        for image in self.matching(source) {
            image.finish(size);
        }
    }

    pub fn fail(&self, source: &str) {
        for image in self.matching(source) {
            image.fail("unreachable host");
        }
    }

    fn matching(&self, source: &str) -> Vec<Rc<CachedImage>> {
        self.requests
            .borrow()
            .iter()
            .filter(|image| image.source() == source)
            .cloned()
            .collect()
    }
}

impl ImageLoader for ManualLoader {
    fn load(&self, image: &Rc<CachedImage>) {
        self.requests.borrow_mut().push(Rc::clone(image));
    }
}
