use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Snapshot of how many image resources an entity needs and how many of them
/// finished loading. `loaded` never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub loaded: u32,
    pub total: u32,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.loaded == self.total
    }

    /// `loaded * 100 / total`, or 100 when there is nothing to load.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        f64::from(self.loaded) * 100.0 / f64::from(self.total)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.loaded, self.total)
    }
}

/// Called with the number of resources that just finished loading.
pub type LoadListener = Rc<dyn Fn(u32)>;

/// Anything that reports load progress and lets parents observe it.
pub trait Loadable {
    fn progress(&self) -> Progress;

    /// Registers a listener for every future increase of `loaded`.
    fn subscribe(&self, listener: LoadListener);
}

/// Counter pair plus the observers interested in its increments.
///
/// Counters only ever grow. Parents never patch a child's callbacks; they
/// subscribe through [`LoadTracker::follow`] and hold the child weakly
/// reachable from their own listener, so one sprite can feed any number of
/// grids and cameras.
#[derive(Default)]
pub struct LoadTracker {
    progress: Cell<Progress>,
    listeners: RefCell<Vec<LoadListener>>,
}

impl LoadTracker {
    pub fn new() -> Rc<Self> {
        Rc::new(LoadTracker::default())
    }

    pub fn progress(&self) -> Progress {
        self.progress.get()
    }

    pub fn add_total(&self, amount: u32) {
        let mut progress = self.progress.get();
        progress.total = progress.total.saturating_add(amount);
        self.progress.set(progress);
    }

    /// Raises `loaded` by `amount` (capped at `total`) and notifies every
    /// listener with the amount actually applied.
    pub fn add_loaded(&self, amount: u32) {
        let mut progress = self.progress.get();
        let loaded = progress.loaded.saturating_add(amount).min(progress.total);
        let applied = loaded - progress.loaded;
        if applied == 0 {
            return;
        }
        progress.loaded = loaded;
        self.progress.set(progress);

        // snapshot so listeners may subscribe while we notify
        let listeners: Vec<LoadListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(applied);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(u32) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Rolls a child's progress into this tracker
    /// - the child's total and already loaded count are added right away
    /// - a child that is still loading gets a listener forwarding its
    ///   future increments here
    pub fn follow<L: Loadable + ?Sized>(self: &Rc<Self>, child: &L) {
        let progress = child.progress();
        self.add_total(progress.total);
        self.add_loaded(progress.loaded);

        if !progress.is_complete() {
            let parent: Weak<LoadTracker> = Rc::downgrade(self);
            let listener: LoadListener = Rc::new(move |amount| {
                if let Some(parent) = parent.upgrade() {
                    parent.add_loaded(amount);
                }
            });
            child.subscribe(listener);
        }
    }
}

impl Loadable for LoadTracker {
    fn progress(&self) -> Progress {
        self.progress.get()
    }

    fn subscribe(&self, listener: LoadListener) {
        self.listeners.borrow_mut().push(listener);
    }
}

impl fmt::Debug for LoadTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTracker")
            .field("progress", &self.progress.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentage_of_empty_progress_is_complete() {
        let progress = Progress::default();
        assert!(progress.is_complete());
        assert_relative_eq!(progress.percentage(), 100.0);
    }

    #[test]
    fn percentage_follows_counters() {
        let progress = Progress {
            loaded: 1,
            total: 3,
        };
        assert!(!progress.is_complete());
        assert_relative_eq!(progress.percentage(), 100.0 / 3.0);
        assert_eq!(progress.to_string(), "1/3");
    }

    #[test]
    fn loaded_is_capped_at_total() {
        let tracker = LoadTracker::new();
        tracker.add_total(1);
        let notified = Rc::new(Cell::new(0));
        let seen = Rc::clone(&notified);
        tracker.subscribe(move |amount| seen.set(seen.get() + amount));

        tracker.add_loaded(1);
        tracker.add_loaded(1);

        assert_eq!(tracker.progress(), Progress { loaded: 1, total: 1 });
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn follow_forwards_future_increments() {
        let child = LoadTracker::new();
        child.add_total(2);
        child.add_loaded(1);

        let parent = LoadTracker::new();
        parent.follow(&*child);
        assert_eq!(parent.progress(), Progress { loaded: 1, total: 2 });

        child.add_loaded(1);
        assert_eq!(parent.progress(), Progress { loaded: 2, total: 2 });
    }

    #[test]
    fn follow_skips_listener_for_finished_child() {
        let child = LoadTracker::new();
        child.add_total(1);
        child.add_loaded(1);

        let parent = LoadTracker::new();
        parent.follow(&*child);

        assert!(parent.progress().is_complete());
        assert!(child.listeners.borrow().is_empty());
    }

    #[test]
    fn dropped_parent_is_not_kept_alive() {
        let child = LoadTracker::new();
        child.add_total(1);
        let parent = LoadTracker::new();
        parent.follow(&*child);
        let weak = Rc::downgrade(&parent);
        drop(parent);

        child.add_loaded(1);
        assert!(weak.upgrade().is_none());
    }
}
