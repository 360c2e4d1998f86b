#![forbid(unsafe_code)]

//! Element and event-target seams.
//!
//! A positioning session never owns the elements it moves. Hosts hand out
//! `Rc<dyn Element>` handles; sessions keep `Weak` copies so an element
//! dropped by its owner reads as absent on the next computation.
//!
//! All handles are single-threaded (`Rc`, interior mutability) to match the
//! cooperative UI-thread execution model.

use std::fmt;
use std::rc::Rc;

use crate::geometry::Rect;
use crate::style::StyleMap;

/// A positionable screen object.
pub trait Element {
    /// Current layout box in viewport coordinates.
    fn bounding_rect(&self) -> Rect;

    /// Whether the element is still attached to its document.
    fn is_connected(&self) -> bool {
        true
    }

    /// Event target of the window owning this element's document, if known.
    fn owner_window(&self) -> Option<Rc<dyn EventTarget>> {
        None
    }

    /// Set one inline style property. An empty value clears it.
    fn set_style_property(&self, name: &str, value: &str);

    /// Read one inline style property.
    fn style_property(&self, name: &str) -> Option<String>;

    /// Assign every property of `style` inline.
    fn apply_style(&self, style: &StyleMap) {
        for (name, value) in style.iter() {
            self.set_style_property(name, value);
        }
    }
}

/// Signals that can make a computed position stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The viewport changed size.
    Resize,
    /// A scroll container moved its content.
    Scroll,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Scroll => "scroll",
        }
    }
}

/// Something listeners can be attached to: a window or a scroll container.
pub trait EventTarget {
    /// Register `callback` for `kind`. Dropping the returned handle without
    /// calling [`Detach::detach`] leaves the listener attached.
    fn listen(&self, kind: EventKind, callback: Rc<dyn Fn()>) -> Detach;
}

/// Handle that removes one subscription when detached.
///
/// Detaching is idempotent: the removal closure runs at most once, and a
/// handle created with [`Detach::noop`] never runs anything.
#[must_use = "dropping a Detach handle leaves the subscription attached"]
pub struct Detach {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Detach {
    pub fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// A handle with nothing to remove.
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Whether the subscription is still attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.remove.is_some()
    }

    /// Remove the subscription. Returns `true` if this call removed it.
    pub fn detach(&mut self) -> bool {
        match self.remove.take() {
            Some(remove) => {
                remove();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Detach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detach")
            .field("attached", &self.is_attached())
            .finish()
    }
}
