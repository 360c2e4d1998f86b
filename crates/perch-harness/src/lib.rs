#![forbid(unsafe_code)]

//! Test harness and reference fixtures for Perch.
//!
//! [`Harness`] wires an in-memory platform (elements, window, scroll
//! containers, rectangle observer, stub solver) to a single-threaded
//! executor so positioning sessions can be driven deterministically.
//!
//! # Example
//!
//! ```
//! use perch_core::Rect;
//! use perch_harness::{FakeElement, Harness};
//! use perch_runtime::PositioningOptions;
//!
//! let mut harness = Harness::new();
//! let reference = FakeElement::new("button", Rect::new(100.0, 100.0, 50.0, 20.0));
//! let floating = FakeElement::new("menu", Rect::from_size(80.0, 30.0));
//!
//! let mut cleanup = harness.positioner().start(
//!     Some(&reference.handle()),
//!     Some(&floating.handle()),
//!     PositioningOptions::new(),
//! );
//! harness.settle();
//!
//! assert_eq!(floating.css("top").as_deref(), Some("128px"));
//! cleanup.dispose();
//! ```

pub mod dom;
pub mod observer;
pub mod solver;

use std::rc::Rc;

use futures::executor::LocalPool;
use perch_core::EventTarget;
use perch_runtime::{GeometrySolver, Host, Positioner, RectObserver, ScrollAncestors};

pub use dom::{FakeElement, FakeTarget};
pub use observer::{FakeRectObserver, ScrollTable};
pub use solver::{CrossAlign, StubSolver};

/// In-memory platform plus the executor that drives pending computations.
pub struct Harness {
    pool: LocalPool,
    pub solver: Rc<StubSolver>,
    pub observer: Rc<FakeRectObserver>,
    pub scroll: Rc<ScrollTable>,
    pub window: Rc<FakeTarget>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
            solver: StubSolver::new(),
            observer: FakeRectObserver::new(),
            scroll: ScrollTable::new(),
            window: FakeTarget::new("window"),
        }
    }

    /// Host backed by this harness.
    #[must_use]
    pub fn host(&self) -> Host {
        let solver: Rc<dyn GeometrySolver> = self.solver.clone();
        let observer: Rc<dyn RectObserver> = self.observer.clone();
        let scroll: Rc<dyn ScrollAncestors> = self.scroll.clone();
        let window: Rc<dyn EventTarget> = self.window.clone();
        Host::new(solver, observer, scroll, window, Rc::new(self.pool.spawner()))
    }

    #[must_use]
    pub fn positioner(&self) -> Positioner {
        Positioner::new(self.host())
    }

    /// Run every pending computation that can make progress.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("solver", &self.solver)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
