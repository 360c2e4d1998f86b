#![forbid(unsafe_code)]

//! Positioning sessions.
//!
//! [`Positioner::start`] creates a session for a reference/floating pair,
//! computes the initial position, attaches the configured recompute
//! triggers, and returns a [`Cleanup`] that tears everything down.
//!
//! # Computation
//!
//! Every trigger calls `compute`, which asks the solver for a position and
//! spawns the pending result on the host executor. Computations may overlap;
//! each carries a sequence number and a result older than the last applied
//! one is discarded. Disposal does not cancel in-flight computations, but a
//! result is only applied while both elements are still alive and
//! connected.
//!
//! # Failure Modes
//!
//! - **Solver rejects**: logged at `warn`, nothing applied; the next trigger
//!   recomputes.
//! - **Executor shut down**: logged at `warn`; same recovery.
//! - **Element dropped or disconnected**: computation and application are
//!   skipped silently.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use perch_core::style::px;
use perch_core::{Detach, Element, EventKind, Placement, Strategy, StyleMap};
use tracing::{debug, trace, warn};

use crate::error::{PerchError, Result, SolverError};
use crate::host::{ComputeRequest, ComputedPosition, Host};
use crate::middleware::{Middleware, build_middleware};
use crate::options::PositioningOptions;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Starts positioning sessions against one [`Host`].
#[derive(Debug, Clone)]
pub struct Positioner {
    host: Host,
}

impl Positioner {
    #[must_use]
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// Start keeping `floating` positioned next to `reference`.
    ///
    /// Returns an inert [`Cleanup`] when either element is absent.
    pub fn start(
        &self,
        reference: Option<&Rc<dyn Element>>,
        floating: Option<&Rc<dyn Element>>,
        options: PositioningOptions,
    ) -> Cleanup {
        start_positioning(&self.host, reference, floating, options)
    }
}

/// Start a positioning session. See [`Positioner::start`].
pub fn start_positioning(
    host: &Host,
    reference: Option<&Rc<dyn Element>>,
    floating: Option<&Rc<dyn Element>>,
    options: PositioningOptions,
) -> Cleanup {
    let (Some(reference), Some(floating)) = (reference, floating) else {
        trace!(
            message = "perch.session.noop",
            has_reference = reference.is_some(),
            has_floating = floating.is_some()
        );
        return Cleanup::inert();
    };

    let window = host.window_for(reference);
    let middleware: Rc<[Middleware]> = build_middleware(&options).into();
    let session = Rc::new(Session {
        id: next_session_id(),
        host: host.clone(),
        reference: Rc::downgrade(reference),
        floating: Rc::downgrade(floating),
        placement: options.placement,
        strategy: options.strategy,
        middleware,
        on_placement_complete: options.on_placement_complete.clone(),
        issued: Cell::new(0),
        applied: Cell::new(0),
    });

    debug!(
        message = "perch.session.start",
        session = session.id,
        placement = %options.placement,
        strategy = %options.strategy,
        middleware = %session.middleware_names(),
        scroll = options.event_listeners.scroll,
        resize = options.event_listeners.resize
    );

    session.compute();

    let mut triggers = Vec::with_capacity(2);
    if options.event_listeners.resize {
        let observed = {
            let session = Rc::clone(&session);
            host.rect_observer
                .observe(reference, Rc::new(move |_rect| session.compute()))
        };
        let resized = {
            let session = Rc::clone(&session);
            window.listen(EventKind::Resize, Rc::new(move || session.compute()))
        };
        triggers.push(Trigger {
            kind: TriggerKind::Resize,
            handles: vec![observed, resized],
        });
    }
    if options.event_listeners.scroll {
        let handles = host
            .scroll_ancestors
            .scroll_ancestors(reference)
            .into_iter()
            .map(|ancestor| {
                let session = Rc::clone(&session);
                ancestor.listen(EventKind::Scroll, Rc::new(move || session.compute()))
            })
            .collect();
        triggers.push(Trigger {
            kind: TriggerKind::Scroll,
            handles,
        });
    }

    Cleanup {
        session_id: Some(session.id),
        on_cleanup: options.on_cleanup,
        triggers,
        disposed: false,
    }
}

/// Live state of one session. Kept alive by its trigger callbacks and by
/// in-flight computations.
struct Session {
    id: u64,
    host: Host,
    reference: Weak<dyn Element>,
    floating: Weak<dyn Element>,
    placement: Placement,
    strategy: Strategy,
    middleware: Rc<[Middleware]>,
    on_placement_complete: Option<Rc<dyn Fn(Placement)>>,
    /// Sequence number of the most recently issued computation.
    issued: Cell<u64>,
    /// Sequence number of the most recently applied computation.
    applied: Cell<u64>,
}

impl Session {
    /// Both elements, if still alive and connected.
    fn elements(&self) -> Option<(Rc<dyn Element>, Rc<dyn Element>)> {
        let reference = self.reference.upgrade()?;
        let floating = self.floating.upgrade()?;
        (reference.is_connected() && floating.is_connected()).then_some((reference, floating))
    }

    /// Arrow element, held by the arrow middleware step.
    fn arrow_element(&self) -> Option<&Rc<dyn Element>> {
        self.middleware.iter().find_map(|step| match step {
            Middleware::Arrow { element, .. } => Some(element),
            _ => None,
        })
    }

    fn middleware_names(&self) -> String {
        self.middleware
            .iter()
            .map(|step| step.kind().name())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn compute(self: &Rc<Self>) {
        let Some((reference, floating)) = self.elements() else {
            trace!(message = "perch.compute.skip", session = self.id);
            return;
        };

        let seq = self.issued.get() + 1;
        self.issued.set(seq);

        let request = ComputeRequest {
            placement: self.placement,
            strategy: self.strategy,
            middleware: Rc::clone(&self.middleware),
        };
        let pending = self
            .host
            .solver
            .compute_position(&reference, &floating, request);

        if let Err(err) = self.schedule(seq, pending) {
            warn!(
                message = "perch.compute.failed",
                session = self.id,
                seq,
                error = %err
            );
        }
    }

    fn schedule(
        self: &Rc<Self>,
        seq: u64,
        pending: LocalBoxFuture<'static, std::result::Result<ComputedPosition, SolverError>>,
    ) -> Result<()> {
        let session = Rc::clone(self);
        self.host.spawner.spawn_local(async move {
            let outcome = pending.await.map_err(PerchError::from);
            session.resolve(seq, outcome);
        })?;
        Ok(())
    }

    fn resolve(&self, seq: u64, outcome: Result<ComputedPosition>) {
        let position = match outcome {
            Ok(position) => position,
            Err(err) => {
                warn!(
                    message = "perch.compute.failed",
                    session = self.id,
                    seq,
                    error = %err
                );
                return;
            }
        };

        let applied = self.applied.get();
        if seq <= applied {
            debug!(
                message = "perch.compute.stale",
                session = self.id,
                seq,
                applied
            );
            return;
        }

        let Some((_, floating)) = self.elements() else {
            trace!(message = "perch.compute.skip", session = self.id, seq);
            return;
        };
        self.applied.set(seq);

        let mut style = StyleMap::new()
            .with("left", px(position.x))
            .with("top", px(position.y))
            .with("position", position.strategy.as_css());
        style.extend(&self.effects(&position));
        floating.apply_style(&style);

        debug!(
            message = "perch.compute.applied",
            session = self.id,
            seq,
            placement = %position.placement,
            style = %style.to_css()
        );

        if let Some(callback) = &self.on_placement_complete {
            callback(position.placement);
        }
    }

    /// Session-side middleware steps, in sequence order. Returns the
    /// floating element's share; the arrow is styled directly.
    fn effects(&self, position: &ComputedPosition) -> StyleMap {
        let mut style = StyleMap::new();
        for step in self.middleware.iter() {
            match step {
                Middleware::TransformOrigin => {
                    style.set("--transform-origin", position.placement.transform_origin());
                }
                Middleware::ArrowPosition => self.position_arrow(position),
                Middleware::SameWidth => {
                    style
                        .set("width", px(position.rects.reference.width))
                        .set("min-width", "unset");
                }
                Middleware::Flip { .. }
                | Middleware::Offset(_)
                | Middleware::Shift { .. }
                | Middleware::Arrow { .. } => {}
            }
        }
        style
    }

    fn position_arrow(&self, position: &ComputedPosition) {
        let (Some(arrow), Some(data)) = (self.arrow_element(), position.arrow) else {
            return;
        };
        // Empty values clear whatever a previous placement left behind.
        let mut style = StyleMap::new()
            .with("left", data.x.map(px).unwrap_or_default())
            .with("top", data.y.map(px).unwrap_or_default())
            .with("right", "")
            .with("bottom", "");
        let static_side = position.placement.side().opposite();
        style.set(static_side.as_str(), "var(--arrow-offset)");
        arrow.apply_style(&style);
    }
}

/// Recompute trigger families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Reference box observation plus window resize.
    Resize,
    /// Scroll on every ancestor scroll container.
    Scroll,
}

#[derive(Debug)]
struct Trigger {
    kind: TriggerKind,
    handles: Vec<Detach>,
}

/// Disposal handle of a positioning session.
///
/// [`dispose`](Self::dispose) runs the `on_cleanup` callback and then
/// detaches every trigger. Dropping a `Cleanup` without disposing leaves the
/// session running.
#[must_use = "dropping a Cleanup leaves the session's listeners attached"]
pub struct Cleanup {
    session_id: Option<u64>,
    on_cleanup: Option<Rc<dyn Fn()>>,
    triggers: Vec<Trigger>,
    disposed: bool,
}

impl Cleanup {
    /// Handle of a session that never started.
    fn inert() -> Self {
        Self {
            session_id: None,
            on_cleanup: None,
            triggers: Vec::new(),
            disposed: false,
        }
    }

    /// Identifier of the underlying session, if one started.
    #[must_use]
    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Whether a session started and has not been disposed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session_id.is_some() && !self.disposed
    }

    /// Listeners still attached, across all triggers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.triggers
            .iter()
            .flat_map(|trigger| &trigger.handles)
            .filter(|handle| handle.is_attached())
            .count()
    }

    /// Listeners still attached for one trigger family.
    #[must_use]
    pub fn listeners_for(&self, kind: TriggerKind) -> usize {
        self.triggers
            .iter()
            .filter(|trigger| trigger.kind == kind)
            .flat_map(|trigger| &trigger.handles)
            .filter(|handle| handle.is_attached())
            .count()
    }

    /// End the session. Returns the number of listeners detached by this
    /// call.
    ///
    /// `on_cleanup` runs on the first call only; later calls detach nothing
    /// and return 0.
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.disposed = true;

        if let Some(on_cleanup) = self.on_cleanup.take() {
            on_cleanup();
        }

        let detached = self
            .triggers
            .iter_mut()
            .flat_map(|trigger| trigger.handles.iter_mut())
            .map(Detach::detach)
            .filter(|removed| *removed)
            .count();

        if let Some(session) = self.session_id {
            debug!(message = "perch.session.dispose", session, detached);
        }
        detached
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup")
            .field("session_id", &self.session_id)
            .field("listeners", &self.listener_count())
            .field("disposed", &self.disposed)
            .finish()
    }
}
