#![forbid(unsafe_code)]

//! Deterministic stand-in for a geometry solver.
//!
//! Placement math is deliberately simple: base coordinates from side and
//! alignment, offset along both axes, flip against the viewport on the main
//! axis, shift by clamping the cross axis into the viewport, and an arrow
//! centered on the reference. Explicit boundary elements are ignored; the
//! viewport is the only clipping box. Calls involving a disconnected
//! element fail with [`SolverError::DetachedElement`].
//!
//! The solver can also hold results back ([`StubSolver::set_gated`]) so
//! tests control the order in which overlapping computations resolve, and
//! reject upcoming calls ([`StubSolver::fail_next`]).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use perch_core::{Alignment, Axis, Coords, Element, Placement, Rect, Side};
use perch_runtime::{
    ArrowData, ComputeRequest, ComputedPosition, ElementRects, GeometrySolver, Middleware, Offset,
    SolverError,
};

/// How placements without an explicit alignment sit on the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossAlign {
    /// Centered on the reference (the usual solver behaviour).
    #[default]
    Center,
    /// Flush with the reference's start edge.
    Start,
}

pub struct StubSolver {
    viewport: Cell<Rect>,
    cross_align: Cell<CrossAlign>,
    gated: Cell<bool>,
    failures: RefCell<VecDeque<SolverError>>,
    gates: RefCell<Vec<Option<oneshot::Sender<()>>>>,
    requests: RefCell<Vec<ComputeRequest>>,
}

impl Default for StubSolver {
    fn default() -> Self {
        Self {
            viewport: Cell::new(Rect::from_size(1024.0, 768.0)),
            cross_align: Cell::new(CrossAlign::Center),
            gated: Cell::new(false),
            failures: RefCell::new(VecDeque::new()),
            gates: RefCell::new(Vec::new()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl StubSolver {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.viewport.set(viewport);
    }

    pub fn set_cross_align(&self, align: CrossAlign) {
        self.cross_align.set(align);
    }

    /// When gated, each result waits for [`release`](Self::release).
    pub fn set_gated(&self, gated: bool) {
        self.gated.set(gated);
    }

    /// Reject the next call with `error`.
    pub fn fail_next(&self, error: SolverError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// Let the `call`-th gated computation (0-based) resolve. Returns
    /// `false` if it was already released or never gated.
    pub fn release(&self, call: usize) -> bool {
        let sender = self
            .gates
            .borrow_mut()
            .get_mut(call)
            .and_then(Option::take);
        sender.is_some_and(|sender| sender.send(()).is_ok())
    }

    /// Release every gated computation in call order.
    pub fn release_all(&self) -> usize {
        let count = self.gates.borrow().len();
        (0..count).filter(|call| self.release(*call)).count()
    }

    /// Number of computations requested so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Every request received, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<ComputeRequest> {
        self.requests.borrow().clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<ComputeRequest> {
        self.requests.borrow().last().cloned()
    }

    /// Solve synchronously.
    #[must_use]
    pub fn solve(&self, reference: Rect, floating: Rect, request: &ComputeRequest) -> ComputedPosition {
        let viewport = self.viewport.get();
        let offset = request.middleware.iter().find_map(|step| match step {
            Middleware::Offset(offset) => Some(*offset),
            _ => None,
        });

        let mut placement = request.placement;
        let mut coords = self.place(reference, floating, placement, offset);

        if let Some(padding) = request.middleware.iter().find_map(|step| match step {
            Middleware::Flip { padding, .. } => Some(*padding),
            _ => None,
        }) && overflows_main(viewport, floating.with_origin(coords), placement.side(), padding)
        {
            let flipped = placement.flipped();
            let alternative = self.place(reference, floating, flipped, offset);
            if !overflows_main(
                viewport,
                floating.with_origin(alternative),
                flipped.side(),
                padding,
            ) {
                placement = flipped;
                coords = alternative;
            }
        }

        if let Some(padding) = request.middleware.iter().find_map(|step| match step {
            Middleware::Shift { padding, .. } => Some(padding.unwrap_or(0.0)),
            _ => None,
        }) {
            coords = shift_cross(viewport, floating, coords, placement.side(), padding);
        }

        let arrow = request.middleware.iter().find_map(|step| match step {
            Middleware::Arrow { element, padding } => Some(arrow_data(
                reference,
                floating,
                coords,
                placement.side(),
                element.bounding_rect(),
                *padding,
            )),
            _ => None,
        });

        ComputedPosition {
            x: coords.x,
            y: coords.y,
            strategy: request.strategy,
            placement,
            rects: ElementRects {
                reference,
                floating: floating.with_origin(coords),
            },
            arrow,
        }
    }

    fn place(
        &self,
        reference: Rect,
        floating: Rect,
        placement: Placement,
        offset: Option<Offset>,
    ) -> Coords {
        let side = placement.side();
        let alignment = placement.alignment().or(match self.cross_align.get() {
            CrossAlign::Center => None,
            CrossAlign::Start => Some(Alignment::Start),
        });

        let center = reference.center();
        let mut coords = match side {
            Side::Top => Coords::new(center.x - floating.width / 2.0, reference.y - floating.height),
            Side::Bottom => Coords::new(center.x - floating.width / 2.0, reference.bottom()),
            Side::Left => Coords::new(reference.x - floating.width, center.y - floating.height / 2.0),
            Side::Right => Coords::new(reference.right(), center.y - floating.height / 2.0),
        };

        match (side.axis(), alignment) {
            (Axis::Y, Some(Alignment::Start)) => coords.x = reference.x,
            (Axis::Y, Some(Alignment::End)) => coords.x = reference.right() - floating.width,
            (Axis::X, Some(Alignment::Start)) => coords.y = reference.y,
            (Axis::X, Some(Alignment::End)) => coords.y = reference.bottom() - floating.height,
            (_, None) => {}
        }

        if let Some(offset) = offset {
            let main = offset.main_axis.unwrap_or(0.0);
            let cross = offset.cross_axis.unwrap_or(0.0);
            match side {
                Side::Top => coords.y -= main,
                Side::Bottom => coords.y += main,
                Side::Left => coords.x -= main,
                Side::Right => coords.x += main,
            }
            match side.axis() {
                Axis::Y => coords.x += cross,
                Axis::X => coords.y += cross,
            }
        }
        coords
    }
}

fn overflows_main(viewport: Rect, rect: Rect, side: Side, padding: f64) -> bool {
    match side {
        Side::Top => rect.y - padding < viewport.y,
        Side::Bottom => rect.bottom() + padding > viewport.bottom(),
        Side::Left => rect.x - padding < viewport.x,
        Side::Right => rect.right() + padding > viewport.right(),
    }
}

fn shift_cross(viewport: Rect, floating: Rect, mut coords: Coords, side: Side, padding: f64) -> Coords {
    match side.axis() {
        Axis::Y => {
            let max = (viewport.right() - floating.width - padding).max(viewport.x + padding);
            coords.x = coords.x.clamp(viewport.x + padding, max);
        }
        Axis::X => {
            let max = (viewport.bottom() - floating.height - padding).max(viewport.y + padding);
            coords.y = coords.y.clamp(viewport.y + padding, max);
        }
    }
    coords
}

fn arrow_data(
    reference: Rect,
    floating: Rect,
    coords: Coords,
    side: Side,
    arrow: Rect,
    padding: f64,
) -> ArrowData {
    let center = reference.center();
    match side.axis() {
        Axis::Y => {
            let max = (floating.width - arrow.width - padding).max(padding);
            let x = (center.x - coords.x - arrow.width / 2.0).clamp(padding, max);
            ArrowData {
                x: Some(x),
                y: None,
            }
        }
        Axis::X => {
            let max = (floating.height - arrow.height - padding).max(padding);
            let y = (center.y - coords.y - arrow.height / 2.0).clamp(padding, max);
            ArrowData {
                x: None,
                y: Some(y),
            }
        }
    }
}

impl GeometrySolver for StubSolver {
    fn compute_position(
        &self,
        reference: &Rc<dyn Element>,
        floating: &Rc<dyn Element>,
        request: ComputeRequest,
    ) -> LocalBoxFuture<'static, Result<ComputedPosition, SolverError>> {
        self.requests.borrow_mut().push(request.clone());

        let outcome = match self.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None if !reference.is_connected() || !floating.is_connected() => {
                Err(SolverError::DetachedElement)
            }
            None => Ok(self.solve(
                reference.bounding_rect(),
                floating.bounding_rect(),
                &request,
            )),
        };

        if !self.gated.get() {
            return future::ready(outcome).boxed_local();
        }

        let (sender, receiver) = oneshot::channel();
        self.gates.borrow_mut().push(Some(sender));
        async move {
            match receiver.await {
                Ok(()) => outcome,
                Err(oneshot::Canceled) => Err(SolverError::rejected("computation abandoned")),
            }
        }
        .boxed_local()
    }
}

impl std::fmt::Debug for StubSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubSolver")
            .field("viewport", &self.viewport.get())
            .field("cross_align", &self.cross_align.get())
            .field("gated", &self.gated.get())
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}
