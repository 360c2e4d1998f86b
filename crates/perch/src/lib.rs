#![forbid(unsafe_code)]

//! Perch public facade crate.
//!
//! Keeps floating elements (tooltips, popovers, menus) positioned next to
//! their reference elements. Geometry, placements, and style builders live
//! in [`core`](prelude::core); sessions, middleware, and disposal live in
//! [`runtime`](prelude::runtime).

pub use perch_core::{
    ArrowStyle, Element, EventKind, EventTarget, Placement, Rect, Strategy, StyleMap,
    build_arrow_style, build_floating_style,
};

#[cfg(feature = "runtime")]
pub use perch_runtime::{
    ArrowOptions, Cleanup, Host, Offset, PerchError, Positioner, PositioningOptions,
    PositioningOverrides, start_positioning,
};

pub mod prelude {
    pub use perch_core as core;
    #[cfg(feature = "runtime")]
    pub use perch_runtime as runtime;
}
