#![forbid(unsafe_code)]

//! Core: geometry, placement vocabulary, inline styles, and the element seams
//! a positioning session talks to.

pub mod element;
pub mod geometry;
pub mod placement;
pub mod style;

pub use element::{Detach, Element, EventKind, EventTarget};
pub use geometry::{Coords, Rect};
pub use placement::{Alignment, Axis, ParsePlacementError, Placement, Side, Strategy};
pub use style::{
    ArrowStyle, INNER_ARROW_STYLE, StyleMap, UNMEASURED_FLOATING_STYLE, build_arrow_style,
    build_floating_style, px,
};
