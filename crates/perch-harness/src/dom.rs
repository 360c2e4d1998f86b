#![forbid(unsafe_code)]

//! In-memory elements and event targets.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::{Detach, Element, EventKind, EventTarget, Rect, StyleMap};

/// Element with a settable layout box and an inspectable inline style.
pub struct FakeElement {
    name: String,
    rect: Cell<Rect>,
    style: RefCell<StyleMap>,
    connected: Cell<bool>,
    window: RefCell<Option<Rc<FakeTarget>>>,
}

impl FakeElement {
    pub fn new(name: impl Into<String>, rect: Rect) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            rect: Cell::new(rect),
            style: RefCell::new(StyleMap::new()),
            connected: Cell::new(true),
            window: RefCell::new(None),
        })
    }

    /// Type-erased handle for positioning APIs.
    pub fn handle(self: &Rc<Self>) -> Rc<dyn Element> {
        Rc::clone(self) as Rc<dyn Element>
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect.get()
    }

    pub fn set_rect(&self, rect: Rect) {
        self.rect.set(rect);
    }

    /// Detach from the document; the element stays alive.
    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    /// Attach this element to a specific window.
    pub fn set_owner_window(&self, window: &Rc<FakeTarget>) {
        *self.window.borrow_mut() = Some(Rc::clone(window));
    }

    /// Snapshot of the inline style.
    #[must_use]
    pub fn style(&self) -> StyleMap {
        self.style.borrow().clone()
    }

    /// One inline property, if set.
    #[must_use]
    pub fn css(&self, name: &str) -> Option<String> {
        self.style.borrow().get(name).map(str::to_string)
    }
}

impl Element for FakeElement {
    fn bounding_rect(&self) -> Rect {
        self.rect.get()
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn owner_window(&self) -> Option<Rc<dyn EventTarget>> {
        self.window
            .borrow()
            .as_ref()
            .map(|window| Rc::clone(window) as Rc<dyn EventTarget>)
    }

    fn set_style_property(&self, name: &str, value: &str) {
        let mut style = self.style.borrow_mut();
        if value.is_empty() {
            style.remove(name);
        } else {
            style.set(name, value);
        }
    }

    fn style_property(&self, name: &str) -> Option<String> {
        self.css(name)
    }
}

impl std::fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeElement")
            .field("name", &self.name)
            .field("rect", &self.rect.get())
            .field("connected", &self.connected.get())
            .finish_non_exhaustive()
    }
}

struct Listener {
    id: u64,
    kind: EventKind,
    callback: Rc<dyn Fn()>,
}

/// Window or scroll container that records listeners and dispatches
/// synthetic events.
pub struct FakeTarget {
    name: String,
    listeners: Rc<RefCell<Vec<Listener>>>,
    next_id: Cell<u64>,
}

impl FakeTarget {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fire `kind`. Returns the number of listeners invoked.
    pub fn dispatch(&self, kind: EventKind) -> usize {
        // Callbacks may attach or detach listeners; invoke from a snapshot.
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| Rc::clone(&listener.callback))
            .collect();
        tracing::trace!(
            message = "harness.dispatch",
            target = %self.name,
            kind = kind.as_str(),
            listeners = callbacks.len()
        );
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|listener| listener.kind == kind)
            .count()
    }

    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl EventTarget for FakeTarget {
    fn listen(&self, kind: EventKind, callback: Rc<dyn Fn()>) -> Detach {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners
            .borrow_mut()
            .push(Listener { id, kind, callback });

        let listeners = Rc::downgrade(&self.listeners);
        Detach::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|listener| listener.id != id);
            }
        })
    }
}

impl std::fmt::Debug for FakeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTarget")
            .field("name", &self.name)
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

/// Stable identity of an element allocation, shared by every handle to it.
pub(crate) fn element_key(element: &Rc<dyn Element>) -> usize {
    Rc::as_ptr(element).cast::<()>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_value_clears_property() {
        let el = FakeElement::new("el", Rect::default());
        el.set_style_property("top", "3px");
        assert_eq!(el.css("top").as_deref(), Some("3px"));
        el.set_style_property("top", "");
        assert!(el.css("top").is_none());
    }

    #[test]
    fn style_snapshot_reflects_every_write() {
        let el = FakeElement::new("el", Rect::default());
        el.apply_style(&StyleMap::new().with("top", "1px").with("left", "2px"));
        el.set_style_property("left", "");
        assert_eq!(el.style(), StyleMap::from_pairs(&[("top", "1px")]));
    }

    #[test]
    fn detach_removes_only_its_listener() {
        let target = FakeTarget::new("window");
        let mut first = target.listen(EventKind::Resize, Rc::new(|| {}));
        let _second = target.listen(EventKind::Resize, Rc::new(|| {}));
        assert_eq!(target.listener_count(EventKind::Resize), 2);
        assert!(first.detach());
        assert_eq!(target.listener_count(EventKind::Resize), 1);
        assert!(!first.detach());
        assert_eq!(target.listener_count(EventKind::Resize), 1);
    }

    #[test]
    fn dispatch_filters_by_kind() {
        let target = FakeTarget::new("scroller");
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        let _sub = target.listen(EventKind::Scroll, Rc::new(move || h.set(h.get() + 1)));
        assert_eq!(target.dispatch(EventKind::Resize), 0);
        assert_eq!(target.dispatch(EventKind::Scroll), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn handles_share_identity() {
        let el = FakeElement::new("el", Rect::default());
        assert_eq!(element_key(&el.handle()), element_key(&el.handle()));
    }

    #[test]
    fn owner_window_is_reported() {
        let el = FakeElement::new("el", Rect::default());
        assert!(el.owner_window().is_none());
        el.set_owner_window(&FakeTarget::new("iframe"));
        assert!(el.owner_window().is_some());
    }
}
