use msmrd_core::{EventKind, EventManager};

#[test]
fn getting_an_unscheduled_pair_returns_the_empty_sentinel_in_canonical_order() {
    let mgr = EventManager::new();
    let e = mgr.get_event(5, 2);
    assert_eq!(e.kind, EventKind::Empty);
    assert_eq!(e.pair, (2, 5));
}

#[test]
fn at_most_one_event_survives_per_pair_regardless_of_argument_order() {
    let mut mgr = EventManager::new();
    mgr.add_event(2.0, 3, 7, 0, 1, EventKind::Binding);
    mgr.add_event(1.0, 7, 3, 0, 2, EventKind::Unbinding);
    assert_eq!(mgr.len(), 1);
    assert_eq!(mgr.get_event(3, 7).kind, EventKind::Unbinding);
}

#[test]
fn advance_can_make_events_ready_and_next_ready_orders_deterministically() {
    let mut mgr = EventManager::new();
    mgr.add_event(0.5, 0, 1, 0, 1, EventKind::Binding);
    mgr.add_event(0.3, 2, 3, 0, 1, EventKind::Binding);
    mgr.advance(0.5);
    let ready = mgr.next_ready();
    assert_eq!(ready.len(), 2);
    assert_eq!(ready[0].pair, (0, 1));
    assert_eq!(ready[1].pair, (2, 3));
}

#[test]
fn removed_events_do_not_reappear_after_advance() {
    let mut mgr = EventManager::new();
    mgr.add_event(0.1, 0, 1, 0, 1, EventKind::Binding);
    mgr.remove_event(0, 1);
    mgr.advance(1.0);
    assert!(mgr.is_empty());
    assert!(mgr.next_ready().is_empty());
}
