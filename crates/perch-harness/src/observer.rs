#![forbid(unsafe_code)]

//! Rectangle observation and scroll-ancestor lookup backed by tables.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::{Detach, Element, EventTarget, Rect};
use perch_runtime::{RectObserver, ScrollAncestors};

use crate::dom::{FakeElement, FakeTarget, element_key};

struct Observation {
    id: u64,
    key: usize,
    callback: Rc<dyn Fn(Rect)>,
}

/// Rectangle observer driven by explicit [`notify`](Self::notify) calls.
#[derive(Default)]
pub struct FakeRectObserver {
    observations: Rc<RefCell<Vec<Observation>>>,
    next_id: Cell<u64>,
}

impl FakeRectObserver {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Report `element`'s current box to its observers. Returns the number
    /// of callbacks invoked.
    pub fn notify(&self, element: &Rc<FakeElement>) -> usize {
        let key = element_key(&element.handle());
        let rect = element.rect();
        let callbacks: Vec<Rc<dyn Fn(Rect)>> = self
            .observations
            .borrow()
            .iter()
            .filter(|observation| observation.key == key)
            .map(|observation| Rc::clone(&observation.callback))
            .collect();
        for callback in &callbacks {
            callback(rect);
        }
        callbacks.len()
    }

    /// Move/resize `element` and notify its observers.
    pub fn resize(&self, element: &Rc<FakeElement>, rect: Rect) -> usize {
        element.set_rect(rect);
        self.notify(element)
    }

    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.observations.borrow().len()
    }
}

impl RectObserver for FakeRectObserver {
    fn observe(&self, element: &Rc<dyn Element>, callback: Rc<dyn Fn(Rect)>) -> Detach {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.observations.borrow_mut().push(Observation {
            id,
            key: element_key(element),
            callback,
        });

        let observations = Rc::downgrade(&self.observations);
        Detach::new(move || {
            if let Some(observations) = observations.upgrade() {
                observations
                    .borrow_mut()
                    .retain(|observation| observation.id != id);
            }
        })
    }
}

/// Scroll ancestors registered per element.
#[derive(Default)]
pub struct ScrollTable {
    entries: RefCell<Vec<(usize, Vec<Rc<FakeTarget>>)>>,
    lookups: Cell<usize>,
}

impl ScrollTable {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Register `ancestors` (nearest first) for `element`, replacing any
    /// previous entry.
    pub fn set(&self, element: &Rc<FakeElement>, ancestors: Vec<Rc<FakeTarget>>) {
        let key = element_key(&element.handle());
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(k, _)| *k != key);
        entries.push((key, ancestors));
    }

    /// Number of times ancestors were resolved.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl ScrollAncestors for ScrollTable {
    fn scroll_ancestors(&self, element: &Rc<dyn Element>) -> Vec<Rc<dyn EventTarget>> {
        self.lookups.set(self.lookups.get() + 1);
        let key = element_key(element);
        self.entries
            .borrow()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, ancestors)| {
                ancestors
                    .iter()
                    .map(|ancestor| Rc::clone(ancestor) as Rc<dyn EventTarget>)
                    .collect()
            })
            .unwrap_or_default()
    }
}
