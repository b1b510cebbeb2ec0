use crate::engine::Size;
use futures::channel::oneshot::channel;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageState {
    Pending,
    /// carries the natural pixel dimensions of the decoded image
    Loaded(Size),
    /// never retried, dependents keep waiting forever
    Failed,
}

type Dependent = Box<dyn FnOnce(Size)>;
type Listener = Box<dyn FnOnce(&CachedImage)>;

/// A URL keyed image shared by every sprite that references it.
///
/// Completion is one-shot:
/// - dependents (sprite load transitions) run first, in registration order
/// - post-load listeners run after all dependents, in registration order
/// - any later completion report is ignored
pub struct CachedImage {
    source: String,
    state: Cell<ImageState>,
    // platform image (HtmlImageElement in the browser), set by the loader
    handle: RefCell<Option<Rc<dyn Any>>>,
    dependents: RefCell<Vec<Dependent>>,
    listeners: RefCell<Vec<Listener>>,
}

impl CachedImage {
    pub fn new(source: impl Into<String>) -> Self {
        CachedImage {
            source: source.into(),
            state: Cell::new(ImageState::Pending),
            handle: RefCell::new(None),
            dependents: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> ImageState {
        self.state.get()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state.get(), ImageState::Loaded(_))
    }

    pub fn natural_size(&self) -> Option<Size> {
        match self.state.get() {
            ImageState::Loaded(size) => Some(size),
            _ => None,
        }
    }

    pub fn attach_handle<T: Any>(&self, handle: Rc<T>) {
        let handle: Rc<dyn Any> = handle;
        *self.handle.borrow_mut() = Some(handle);
    }

    pub fn handle<T: Any>(&self) -> Option<Rc<T>> {
        let handle = self.handle.borrow().clone()?;
        handle.downcast::<T>().ok()
    }

    /// Runs `dependent` once the image is loaded, immediately if it already is.
    pub fn when_loaded(&self, dependent: impl FnOnce(Size) + 'static) {
        match self.state.get() {
            ImageState::Loaded(size) => dependent(size),
            ImageState::Pending => self.dependents.borrow_mut().push(Box::new(dependent)),
            ImageState::Failed => {}
        }
    }

    /// Post-load notification, fired after every dependent has run.
    pub fn on_loaded(&self, listener: impl FnOnce(&CachedImage) + 'static) {
        match self.state.get() {
            ImageState::Loaded(_) => listener(self),
            ImageState::Pending => self.listeners.borrow_mut().push(Box::new(listener)),
            ImageState::Failed => {}
        }
    }

    /// Resolves with the natural size once loaded, or `None` when the fetch
    /// failed. Stays pending as long as the image does.
    pub fn loaded(&self) -> impl Future<Output = Option<Size>> {
        let (tx, rx) = channel::<Size>();
        // a failed image drops the sender, which cancels the receiver
        self.when_loaded(move |size| {
            let _ = tx.send(size);
        });
        async move { rx.await.ok() }
    }

    /// Reports a finished fetch/decode. Only the first report counts.
    pub fn finish(&self, size: Size) {
        if self.state.get() != ImageState::Pending {
            log::debug!("ignoring repeated completion of image {}", self.source);
            return;
        }
        self.state.set(ImageState::Loaded(size));
        log::debug!(
            "image {} loaded ({}x{})",
            self.source,
            size.width,
            size.height
        );

        let dependents = std::mem::take(&mut *self.dependents.borrow_mut());
        for dependent in dependents {
            dependent(size);
        }
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            listener(self);
        }
    }

    /// Reports a failed fetch. Dependents are dropped without firing.
    pub fn fail(&self, reason: &str) {
        if self.state.get() != ImageState::Pending {
            return;
        }
        log::warn!("image {} failed to load: {}", self.source, reason);
        self.state.set(ImageState::Failed);
        self.dependents.borrow_mut().clear();
        self.listeners.borrow_mut().clear();
    }
}

impl fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedImage")
            .field("source", &self.source)
            .field("state", &self.state.get())
            .finish()
    }
}

/// Starts fetching an image. Completion is reported later through
/// [`CachedImage::finish`] or [`CachedImage::fail`].
pub trait ImageLoader {
    fn load(&self, image: &Rc<CachedImage>);
}

/// Owned URL -> image map. Entries live as long as the cache; there is no
/// eviction.
pub struct ImageCache {
    loader: Box<dyn ImageLoader>,
    images: RefCell<HashMap<String, Rc<CachedImage>>>,
}

impl ImageCache {
    pub fn new(loader: impl ImageLoader + 'static) -> Self {
        ImageCache {
            loader: Box::new(loader),
            images: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the shared image for `source`, starting exactly one fetch the
    /// first time a source is requested.
    pub fn get(&self, source: &str) -> Rc<CachedImage> {
        if let Some(image) = self.images.borrow().get(source) {
            return Rc::clone(image);
        }

        let image = Rc::new(CachedImage::new(source));
        self.images
            .borrow_mut()
            .insert(source.to_owned(), Rc::clone(&image));
        log::debug!("fetching image {}", source);
        self.loader.load(&image);
        image
    }

    pub fn contains(&self, source: &str) -> bool {
        self.images.borrow().contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.images.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.borrow().is_empty()
    }
}
