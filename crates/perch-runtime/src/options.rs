#![forbid(unsafe_code)]

//! Positioning configuration.
//!
//! [`PositioningOptions`] is a complete value: every field has a default and
//! callers override fields with the builder setters. [`PositioningOverrides`]
//! is the partial form loaded from configuration files; merging is a shallow
//! field-wise override, never a deep merge.
//!
//! Element handles and callbacks only exist on [`PositioningOptions`]; they
//! have no serialized form.

use std::fmt;
use std::rc::Rc;

use perch_core::{Element, Placement, Strategy};
use serde::{Deserialize, Deserializer, Serialize};

/// Main-axis gap used when no gutter is configured.
pub const DEFAULT_GUTTER: f64 = 8.0;

/// Padding between the floating element and the boundary edge before flip
/// engages.
pub const FLIP_PADDING: f64 = 8.0;

/// Arrow padding from the floating element's corners when unspecified.
pub const DEFAULT_ARROW_PADDING: f64 = 8.0;

/// Displacement of the floating element.
///
/// `main_axis` moves it away from the reference along the placement side;
/// `cross_axis` slides it along the reference edge. Unset axes are left to
/// the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_axis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_axis: Option<f64>,
}

impl Offset {
    #[must_use]
    pub const fn new(main_axis: f64, cross_axis: f64) -> Self {
        Self {
            main_axis: Some(main_axis),
            cross_axis: Some(cross_axis),
        }
    }

    /// Main-axis displacement only.
    #[must_use]
    pub const fn main(main_axis: f64) -> Self {
        Self {
            main_axis: Some(main_axis),
            cross_axis: None,
        }
    }
}

/// Clipping context for flip and shift.
#[derive(Clone, Default)]
pub enum Boundary {
    /// The reference element's nearest scrollable ancestors.
    #[default]
    ClippingAncestors,
    /// An explicit set of boundary elements.
    Elements(Vec<Rc<dyn Element>>),
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClippingAncestors => f.write_str("ClippingAncestors"),
            Self::Elements(elements) => write!(f, "Elements(<{} elements>)", elements.len()),
        }
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ClippingAncestors, Self::ClippingAncestors) => true,
            (Self::Elements(a), Self::Elements(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

/// Which reactive triggers a session attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventListenersRepr")]
pub struct EventListeners {
    pub scroll: bool,
    pub resize: bool,
}

impl EventListeners {
    pub const ALL: Self = Self {
        scroll: true,
        resize: true,
    };

    pub const NONE: Self = Self {
        scroll: false,
        resize: false,
    };

    #[must_use]
    pub const fn any(self) -> bool {
        self.scroll || self.resize
    }
}

impl Default for EventListeners {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<bool> for EventListeners {
    fn from(enabled: bool) -> Self {
        if enabled { Self::ALL } else { Self::NONE }
    }
}

/// Accepts `true`/`false` or `{ "scroll": .., "resize": .. }`; a missing key
/// in the object form means disabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventListenersRepr {
    All(bool),
    Each {
        #[serde(default)]
        scroll: bool,
        #[serde(default)]
        resize: bool,
    },
}

impl From<EventListenersRepr> for EventListeners {
    fn from(repr: EventListenersRepr) -> Self {
        match repr {
            EventListenersRepr::All(enabled) => enabled.into(),
            EventListenersRepr::Each { scroll, resize } => Self { scroll, resize },
        }
    }
}

/// Arrow element configuration.
#[derive(Clone)]
pub struct ArrowOptions {
    pub element: Rc<dyn Element>,
    /// Minimum distance from the floating element's corners; defaults to
    /// [`DEFAULT_ARROW_PADDING`].
    pub padding: Option<f64>,
}

impl ArrowOptions {
    pub fn new(element: Rc<dyn Element>) -> Self {
        Self {
            element,
            padding: None,
        }
    }

    #[must_use]
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }
}

impl fmt::Debug for ArrowOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrowOptions")
            .field("padding", &self.padding)
            .finish_non_exhaustive()
    }
}

/// Configuration of one positioning session.
#[derive(Clone)]
pub struct PositioningOptions {
    pub strategy: Strategy,
    pub placement: Placement,
    /// Explicit displacement. Ignored while a non-zero `gutter` is set.
    pub offset: Option<Offset>,
    /// Main-axis gap shorthand; wins over `offset`.
    pub gutter: Option<f64>,
    pub flip: bool,
    pub same_width: bool,
    pub boundary: Boundary,
    pub event_listeners: EventListeners,
    pub arrow: Option<ArrowOptions>,
    pub shift_padding: Option<f64>,
    pub on_placement_complete: Option<Rc<dyn Fn(Placement)>>,
    pub on_cleanup: Option<Rc<dyn Fn()>>,
}

impl Default for PositioningOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Absolute,
            placement: Placement::Bottom,
            offset: None,
            gutter: Some(DEFAULT_GUTTER),
            flip: true,
            same_width: false,
            boundary: Boundary::ClippingAncestors,
            event_listeners: EventListeners::ALL,
            arrow: None,
            shift_padding: None,
            on_placement_complete: None,
            on_cleanup: None,
        }
    }
}

impl fmt::Debug for PositioningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositioningOptions")
            .field("strategy", &self.strategy)
            .field("placement", &self.placement)
            .field("offset", &self.offset)
            .field("gutter", &self.gutter)
            .field("flip", &self.flip)
            .field("same_width", &self.same_width)
            .field("boundary", &self.boundary)
            .field("event_listeners", &self.event_listeners)
            .field("arrow", &self.arrow)
            .field("shift_padding", &self.shift_padding)
            .field(
                "on_placement_complete",
                &self.on_placement_complete.is_some(),
            )
            .field("on_cleanup", &self.on_cleanup.is_some())
            .finish()
    }
}

impl PositioningOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: Option<Offset>) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn gutter(mut self, gutter: Option<f64>) -> Self {
        self.gutter = gutter;
        self
    }

    #[must_use]
    pub fn flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    #[must_use]
    pub fn same_width(mut self, same_width: bool) -> Self {
        self.same_width = same_width;
        self
    }

    #[must_use]
    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub fn event_listeners(mut self, listeners: impl Into<EventListeners>) -> Self {
        self.event_listeners = listeners.into();
        self
    }

    #[must_use]
    pub fn arrow(mut self, arrow: ArrowOptions) -> Self {
        self.arrow = Some(arrow);
        self
    }

    #[must_use]
    pub fn shift_padding(mut self, padding: f64) -> Self {
        self.shift_padding = Some(padding);
        self
    }

    #[must_use]
    pub fn on_placement_complete(mut self, callback: impl Fn(Placement) + 'static) -> Self {
        self.on_placement_complete = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_cleanup(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_cleanup = Some(Rc::new(callback));
        self
    }

    /// Overlay `overrides` on this configuration.
    #[must_use]
    pub fn merged(self, overrides: PositioningOverrides) -> Self {
        overrides.apply_to(self)
    }

    /// Offset handed to the offset middleware, if any.
    ///
    /// A non-zero gutter becomes `{ main_axis: gutter }` and shadows any
    /// explicit offset; otherwise the explicit offset is used verbatim. A
    /// NaN gutter counts as unset.
    #[must_use]
    pub fn effective_offset(&self) -> Option<Offset> {
        match self.gutter {
            Some(gutter) if gutter != 0.0 && !gutter.is_nan() => Some(Offset::main(gutter)),
            _ => self.offset,
        }
    }
}

/// Partial configuration, typically deserialized from a settings file.
///
/// Every present field replaces the field of the same name in the base
/// options. `"gutter": null` clears the gutter so an explicit `offset` takes
/// effect.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PositioningOverrides {
    pub strategy: Option<Strategy>,
    pub placement: Option<Placement>,
    pub offset: Option<Offset>,
    #[serde(default, deserialize_with = "present")]
    pub gutter: Option<Option<f64>>,
    pub flip: Option<bool>,
    pub same_width: Option<bool>,
    pub event_listeners: Option<EventListeners>,
    pub shift_padding: Option<f64>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key
/// (`None`, via `#[serde(default)]`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PositioningOverrides {
    /// Shallow field-wise merge over `base`.
    #[must_use]
    pub fn apply_to(self, mut base: PositioningOptions) -> PositioningOptions {
        if let Some(strategy) = self.strategy {
            base.strategy = strategy;
        }
        if let Some(placement) = self.placement {
            base.placement = placement;
        }
        if let Some(offset) = self.offset {
            base.offset = Some(offset);
        }
        if let Some(gutter) = self.gutter {
            base.gutter = gutter;
        }
        if let Some(flip) = self.flip {
            base.flip = flip;
        }
        if let Some(same_width) = self.same_width {
            base.same_width = same_width;
        }
        if let Some(listeners) = self.event_listeners {
            base.event_listeners = listeners;
        }
        if let Some(padding) = self.shift_padding {
            base.shift_padding = Some(padding);
        }
        base
    }

    /// Whether the overlay changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
