#![forbid(unsafe_code)]

//! Platform seams a positioning session runs against.
//!
//! The geometry solver, rectangle observer, and scroll-ancestor resolver are
//! external collaborators: this crate decides which middleware to request,
//! in what order, and when to ask, never how placement math works.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawn;
use perch_core::{Detach, Element, EventTarget, Placement, Rect, Strategy};

use crate::error::SolverError;
use crate::middleware::Middleware;

/// What the solver is asked to compute.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: Rc<[Middleware]>,
}

/// Boxes of both elements as the solver measured them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementRects {
    pub reference: Rect,
    pub floating: Rect,
}

/// Arrow offset within the floating element. An axis is `None` when the
/// arrow does not move along it for the resolved placement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArrowData {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Solver output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPosition {
    pub x: f64,
    pub y: f64,
    pub strategy: Strategy,
    /// Placement after flip; may differ from the requested one.
    pub placement: Placement,
    pub rects: ElementRects,
    /// Present when arrow middleware was requested.
    pub arrow: Option<ArrowData>,
}

/// Computes floating-element coordinates.
pub trait GeometrySolver {
    fn compute_position(
        &self,
        reference: &Rc<dyn Element>,
        floating: &Rc<dyn Element>,
        request: ComputeRequest,
    ) -> LocalBoxFuture<'static, Result<ComputedPosition, SolverError>>;
}

/// Reports layout-box changes of an element.
pub trait RectObserver {
    /// Invoke `callback` with the new box whenever `element`'s layout box
    /// changes.
    fn observe(&self, element: &Rc<dyn Element>, callback: Rc<dyn Fn(Rect)>) -> Detach;
}

/// Resolves the scroll containers enclosing an element.
pub trait ScrollAncestors {
    /// Ancestor scroll containers, nearest first.
    fn scroll_ancestors(&self, element: &Rc<dyn Element>) -> Vec<Rc<dyn EventTarget>>;
}

/// Bundle of collaborators shared by every session a [`Positioner`] starts.
///
/// [`Positioner`]: crate::Positioner
#[derive(Clone)]
pub struct Host {
    pub solver: Rc<dyn GeometrySolver>,
    pub rect_observer: Rc<dyn RectObserver>,
    pub scroll_ancestors: Rc<dyn ScrollAncestors>,
    /// Global window, used when an element cannot name its own.
    pub window: Rc<dyn EventTarget>,
    /// Executor that drives pending computations on the UI thread.
    pub spawner: Rc<dyn LocalSpawn>,
}

impl Host {
    pub fn new(
        solver: Rc<dyn GeometrySolver>,
        rect_observer: Rc<dyn RectObserver>,
        scroll_ancestors: Rc<dyn ScrollAncestors>,
        window: Rc<dyn EventTarget>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            solver,
            rect_observer,
            scroll_ancestors,
            window,
            spawner,
        }
    }

    /// Window whose resize signal affects `element`.
    pub fn window_for(&self, element: &Rc<dyn Element>) -> Rc<dyn EventTarget> {
        element
            .owner_window()
            .unwrap_or_else(|| Rc::clone(&self.window))
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
