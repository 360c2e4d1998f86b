#![forbid(unsafe_code)]

//! Reactive positioning sessions.
//!
//! A session keeps a floating element (tooltip, popover, menu) attached to a
//! reference element: it composes the positioning middleware from
//! [`PositioningOptions`], asks the host's geometry solver for coordinates,
//! writes them inline, and recomputes whenever the viewport, a scroll
//! container, or the reference element's box changes.
//!
//! # Architecture
//!
//! - [`options`]: fully defaulted configuration plus serde overlays.
//! - [`middleware`]: the ordered middleware sequence handed to the solver.
//! - [`host`]: platform seams (solver, rectangle observer, scroll-ancestor
//!   resolver, window, executor).
//! - [`positioner`]: session start, computation, triggers, and [`Cleanup`].
//!
//! # Invariants
//!
//! 1. A session starts only when both elements are present; otherwise the
//!    returned [`Cleanup`] is inert.
//! 2. Middleware order is fixed: transform-origin, flip, offset, shift,
//!    arrow, arrow-position, same-width.
//! 3. A computation result never overwrites the result of a later
//!    computation.
//! 4. A failed computation never detaches triggers.

pub mod error;
pub mod host;
pub mod middleware;
pub mod options;
pub mod positioner;

pub use error::{PerchError, SolverError};
pub use host::{
    ArrowData, ComputeRequest, ComputedPosition, ElementRects, GeometrySolver, Host, RectObserver,
    ScrollAncestors,
};
pub use middleware::{Middleware, MiddlewareKind, build_middleware};
pub use options::{
    ArrowOptions, Boundary, EventListeners, Offset, PositioningOptions, PositioningOverrides,
};
pub use positioner::{Cleanup, Positioner, TriggerKind, start_positioning};
