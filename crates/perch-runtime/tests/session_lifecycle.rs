//! Session start, trigger attachment, and disposal.

use std::cell::Cell;
use std::rc::Rc;

use perch_core::{EventKind, Rect};
use perch_harness::{FakeElement, FakeTarget, Harness};
use perch_runtime::{EventListeners, PositioningOptions, TriggerKind};

struct Fixture {
    harness: Harness,
    reference: Rc<FakeElement>,
    floating: Rc<FakeElement>,
    list: Rc<FakeTarget>,
    page: Rc<FakeTarget>,
}

fn fixture() -> Fixture {
    let harness = Harness::new();
    let reference = FakeElement::new("reference", Rect::new(100.0, 100.0, 50.0, 20.0));
    let floating = FakeElement::new("floating", Rect::from_size(80.0, 30.0));
    let list = FakeTarget::new("list");
    let page = FakeTarget::new("page");
    harness
        .scroll
        .set(&reference, vec![Rc::clone(&list), Rc::clone(&page)]);
    Fixture {
        harness,
        reference,
        floating,
        list,
        page,
    }
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0u32));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

#[test]
fn missing_reference_is_inert() {
    let mut fx = fixture();
    let (cleanups, on_cleanup) = counter();
    let mut cleanup = fx.harness.positioner().start(
        None,
        Some(&fx.floating.handle()),
        PositioningOptions::new().on_cleanup(on_cleanup),
    );
    fx.harness.settle();

    assert!(!cleanup.is_active());
    assert_eq!(cleanup.session_id(), None);
    assert_eq!(cleanup.listener_count(), 0);
    assert_eq!(fx.harness.solver.calls(), 0);
    assert!(fx.floating.style().is_empty());
    assert_eq!(fx.harness.window.total_listeners(), 0);

    assert_eq!(cleanup.dispose(), 0);
    assert_eq!(cleanups.get(), 0);
}

#[test]
fn missing_floating_is_inert() {
    let mut fx = fixture();
    let (cleanups, on_cleanup) = counter();
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        None,
        PositioningOptions::new().on_cleanup(on_cleanup),
    );
    fx.harness.settle();

    assert!(!cleanup.is_active());
    assert_eq!(fx.harness.solver.calls(), 0);
    assert_eq!(fx.harness.observer.observation_count(), 0);
    assert_eq!(fx.list.total_listeners(), 0);
    assert_eq!(cleanup.dispose(), 0);
    assert_eq!(cleanup.dispose(), 0);
    assert_eq!(cleanups.get(), 0);
}

#[test]
fn default_listeners_attach_resize_and_scroll() {
    let fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );

    assert!(cleanup.is_active());
    assert_eq!(cleanup.listeners_for(TriggerKind::Resize), 2);
    assert_eq!(cleanup.listeners_for(TriggerKind::Scroll), 2);
    assert_eq!(cleanup.listener_count(), 4);
    assert_eq!(fx.harness.observer.observation_count(), 1);
    assert_eq!(fx.harness.window.listener_count(EventKind::Resize), 1);
    assert_eq!(fx.list.listener_count(EventKind::Scroll), 1);
    assert_eq!(fx.page.listener_count(EventKind::Scroll), 1);
    assert_eq!(fx.harness.solver.calls(), 1, "initial placement");
    drop(cleanup);
}

#[test]
fn disabled_listeners_detach_nothing() {
    let fx = fixture();
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new().event_listeners(false),
    );

    assert_eq!(cleanup.listener_count(), 0);
    assert_eq!(fx.harness.window.total_listeners(), 0);
    assert_eq!(fx.list.total_listeners(), 0);
    assert_eq!(fx.harness.scroll.lookups(), 0);
    assert_eq!(fx.harness.solver.calls(), 1);
    assert_eq!(cleanup.dispose(), 0);
}

#[test]
fn scroll_only_listeners() {
    let fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new().event_listeners(EventListeners {
            scroll: true,
            resize: false,
        }),
    );
    assert_eq!(fx.harness.solver.calls(), 1);

    assert_eq!(fx.harness.window.dispatch(EventKind::Resize), 0);
    assert_eq!(fx.harness.observer.notify(&fx.reference), 0);
    assert_eq!(fx.harness.solver.calls(), 1);

    assert_eq!(fx.page.dispatch(EventKind::Scroll), 1);
    assert_eq!(fx.harness.solver.calls(), 2);
    assert_eq!(cleanup.listeners_for(TriggerKind::Resize), 0);
    drop(cleanup);
}

#[test]
fn resize_only_listeners() {
    let fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new().event_listeners(EventListeners {
            scroll: false,
            resize: true,
        }),
    );

    assert_eq!(fx.list.dispatch(EventKind::Scroll), 0);
    assert_eq!(fx.harness.solver.calls(), 1);
    assert_eq!(fx.harness.scroll.lookups(), 0);

    fx.harness.window.dispatch(EventKind::Resize);
    assert_eq!(fx.harness.solver.calls(), 2);
    fx.harness
        .observer
        .resize(&fx.reference, Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(fx.harness.solver.calls(), 3);
    drop(cleanup);
}

#[test]
fn scroll_ancestors_resolved_once() {
    let fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    for _ in 0..3 {
        fx.list.dispatch(EventKind::Scroll);
    }
    assert_eq!(fx.harness.scroll.lookups(), 1);
    assert_eq!(fx.harness.solver.calls(), 4);
    drop(cleanup);
}

#[test]
fn dispose_runs_on_cleanup_once_and_detaches_all() {
    let fx = fixture();
    let (cleanups, on_cleanup) = counter();
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new().on_cleanup(on_cleanup),
    );

    assert_eq!(cleanup.dispose(), 4);
    assert_eq!(cleanups.get(), 1);
    assert!(!cleanup.is_active());
    assert_eq!(cleanup.listener_count(), 0);
    assert_eq!(fx.harness.window.total_listeners(), 0);
    assert_eq!(fx.harness.observer.observation_count(), 0);
    assert_eq!(fx.list.total_listeners(), 0);
    assert_eq!(fx.page.total_listeners(), 0);

    assert_eq!(cleanup.dispose(), 0);
    assert_eq!(cleanups.get(), 1);
}

#[test]
fn on_cleanup_runs_before_listeners_detach() {
    let fx = fixture();
    let window = Rc::clone(&fx.harness.window);
    let seen = Rc::new(Cell::new(usize::MAX));
    let s = Rc::clone(&seen);
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new().on_cleanup(move || s.set(window.total_listeners())),
    );
    cleanup.dispose();
    assert_eq!(seen.get(), 1);
}

#[test]
fn triggers_after_dispose_do_nothing() {
    let fx = fixture();
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    cleanup.dispose();

    assert_eq!(fx.harness.window.dispatch(EventKind::Resize), 0);
    assert_eq!(fx.list.dispatch(EventKind::Scroll), 0);
    assert_eq!(fx.harness.observer.notify(&fx.reference), 0);
    assert_eq!(fx.harness.solver.calls(), 1);
}

#[test]
fn owner_window_takes_precedence() {
    let fx = fixture();
    let frame_window = FakeTarget::new("frame");
    fx.reference.set_owner_window(&frame_window);
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );

    assert_eq!(frame_window.listener_count(EventKind::Resize), 1);
    assert_eq!(fx.harness.window.listener_count(EventKind::Resize), 0);

    frame_window.dispatch(EventKind::Resize);
    assert_eq!(fx.harness.solver.calls(), 2);
    cleanup.dispose();
    assert_eq!(frame_window.total_listeners(), 0);
}

#[test]
fn dropped_floating_skips_computation() {
    let mut fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    fx.harness.settle();
    assert_eq!(fx.harness.solver.calls(), 1);

    fx.floating = FakeElement::new("replacement", Rect::default());
    fx.harness.window.dispatch(EventKind::Resize);
    fx.harness.settle();
    assert_eq!(fx.harness.solver.calls(), 1);
    assert!(fx.floating.style().is_empty());
    drop(cleanup);
}

#[test]
fn disconnected_reference_skips_computation() {
    let fx = fixture();
    let cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    fx.reference.disconnect();
    fx.page.dispatch(EventKind::Scroll);
    assert_eq!(fx.harness.solver.calls(), 1);
    assert!(cleanup.is_active());
    drop(cleanup);
}

#[test]
fn dispose_does_not_cancel_in_flight_computation() {
    let mut fx = fixture();
    fx.harness.solver.set_gated(true);
    let mut cleanup = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    cleanup.dispose();

    assert_eq!(fx.harness.solver.release_all(), 1);
    fx.harness.settle();
    assert_eq!(fx.floating.css("top").as_deref(), Some("128px"));
}

#[test]
fn sessions_are_independent() {
    let fx = fixture();
    let other = FakeElement::new("other", Rect::from_size(40.0, 40.0));
    let mut first = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&fx.floating.handle()),
        PositioningOptions::new(),
    );
    let mut second = fx.harness.positioner().start(
        Some(&fx.reference.handle()),
        Some(&other.handle()),
        PositioningOptions::new(),
    );
    assert_ne!(first.session_id(), second.session_id());
    assert_eq!(fx.harness.window.listener_count(EventKind::Resize), 2);

    first.dispose();
    assert_eq!(fx.harness.window.listener_count(EventKind::Resize), 1);
    fx.harness.window.dispatch(EventKind::Resize);
    assert_eq!(fx.harness.solver.calls(), 3);
    second.dispose();
}
