use super::*;
use crate::model::catalog::demo_servers;
use crate::model::server::ServerStatus;
use std::sync::atomic::{AtomicUsize, Ordering};

fn server(id: &str, name: &str) -> ServerRecord {
    ServerRecord::new(id, name, ServerStatus::Online, "10.0.0.1", "Lab", "1 day")
}

fn add(store: &mut Store, record: ServerRecord) {
    store.dispatch(StoreEvent::Add { server: record }).unwrap();
}

fn counter() -> (Arc<AtomicUsize>, impl FnMut(&Option<f64>) + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = count.clone();
    (count, move |_: &Option<f64>| {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

// --- Commands ---

#[test]
fn test_add_inserts_record_and_appends_id() {
    let mut store = Store::new();
    for record in demo_servers() {
        add(&mut store, record);
    }

    let state = store.state();
    assert_eq!(state.server_ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(store.len(), 5);
    for id in &state.server_ids {
        assert!(state.servers.contains_key(id), "{id} missing from map");
    }
}

#[test]
fn test_duplicate_add_overwrites_record_and_repeats_id() {
    let mut store = Store::new();
    add(&mut store, server("1", "First"));
    add(&mut store, server("1", "Second"));

    let state = store.state();
    assert_eq!(state.server_ids, vec!["1", "1"]);
    assert_eq!(state.servers.len(), 1);
    assert_eq!(state.servers["1"].name, "Second");
}

#[test]
fn test_set_ping_updates_only_ping() {
    let mut store = Store::new();
    let original = server("1", "Alpha");
    add(&mut store, original.clone());

    store
        .dispatch(StoreEvent::SetPing {
            id: "1".to_string(),
            ping: 42.5,
        })
        .unwrap();

    let stored = &store.state().servers["1"];
    assert_eq!(stored.ping, Some(42.5));
    assert_eq!(
        ServerRecord {
            ping: None,
            ..stored.clone()
        },
        original
    );
}

#[test]
fn test_set_ping_unknown_server_fails_without_mutation() {
    let mut store = Store::new();
    add(&mut store, server("1", "Alpha"));
    let before = store.state().clone();

    let (count, callback) = counter();
    store.subscribe(|view| view.servers().get("1").and_then(|s| s.ping), callback);

    let err = store
        .dispatch(StoreEvent::SetPing {
            id: "404".to_string(),
            ping: 1.0,
        })
        .unwrap_err();

    assert_eq!(err, StoreError::UnknownServer("404".to_string()));
    assert_eq!(store.state(), &before);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_set_ping_on_empty_store_fails() {
    let mut store = Store::new();
    let result = store.dispatch(StoreEvent::SetPing {
        id: "1".to_string(),
        ping: 10.0,
    });
    assert!(matches!(result, Err(StoreError::UnknownServer(id)) if id == "1"));
    assert!(store.is_empty());
}

// --- Subscriptions ---

#[test]
fn test_item_subscription_ignores_other_records() {
    let mut store = Store::new();
    add(&mut store, server("1", "Alpha"));
    add(&mut store, server("2", "Beta"));

    let (count, callback) = counter();
    store.subscribe(
        |view| view.server("1").and_then(|s| s.ping),
        callback,
    );

    store
        .dispatch(StoreEvent::SetPing {
            id: "2".to_string(),
            ping: 12.0,
        })
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    store
        .dispatch(StoreEvent::SetPing {
            id: "1".to_string(),
            ping: 12.0,
        })
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_order_selection_ignores_pings() {
    let mut store = Store::new();
    let ids = store.select(|view| view.server_ids().to_vec());
    assert_eq!(ids.version(), 1);
    assert!(ids.get().is_empty());

    add(&mut store, server("1", "Alpha"));
    assert_eq!(ids.get(), vec!["1"]);
    assert_eq!(ids.version(), 2);

    store
        .dispatch(StoreEvent::SetPing {
            id: "1".to_string(),
            ping: 3.0,
        })
        .unwrap();
    assert_eq!(ids.version(), 2);
}

#[test]
fn test_selection_of_absent_server_updates_when_added() {
    let mut store = Store::new();
    let selected = store.select(|view| view.server("3").cloned());
    assert_eq!(selected.get(), None);

    add(&mut store, server("1", "Alpha"));
    assert_eq!(selected.version(), 1);

    add(&mut store, server("3", "Gamma"));
    assert_eq!(selected.get().map(|s| s.name), Some("Gamma".to_string()));
    assert_eq!(selected.version(), 2);
}

#[test]
fn test_callback_skipped_when_value_unchanged() {
    let mut store = Store::new();
    add(&mut store, server("1", "Alpha"));

    let (count, callback) = counter();
    store.subscribe(|view| view.server("1").and_then(|s| s.ping), callback);

    for _ in 0..3 {
        store
            .dispatch(StoreEvent::SetPing {
                id: "1".to_string(),
                ping: 7.0,
            })
            .unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_all_servers_projection_sees_every_ping() {
    let mut store = Store::new();
    for record in demo_servers() {
        add(&mut store, record);
    }

    let pinged = store.select(|view| view.servers().values().filter(|s| s.ping.is_some()).count());
    for (i, id) in ["1", "2", "3", "4", "5"].iter().enumerate() {
        store
            .dispatch(StoreEvent::SetPing {
                id: id.to_string(),
                ping: i as f64,
            })
            .unwrap();
    }

    assert_eq!(pinged.get(), 5);
    assert_eq!(pinged.version(), 6);
}

#[test]
fn test_select_with_runs_hook_on_change() {
    let mut store = Store::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let hook_hits = hits.clone();
    let _ids = store.select_with(
        |view| view.server_ids().len(),
        move || {
            hook_hits.fetch_add(1, Ordering::SeqCst);
        },
    );

    add(&mut store, server("1", "Alpha"));
    add(&mut store, server("2", "Beta"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let mut store = Store::new();
    let ids = store.select(|view| view.server_ids().len());
    assert_eq!(store.subscriber_count(), 1);

    assert!(store.unsubscribe(ids.id()));
    assert!(!store.unsubscribe(ids.id()));
    assert_eq!(store.subscriber_count(), 0);

    add(&mut store, server("1", "Alpha"));
    assert_eq!(ids.get(), 0);
    assert_eq!(ids.version(), 1);
}

#[test]
fn test_dropped_selector_is_released_on_next_dispatch() {
    let mut store = Store::new();
    let kept = store.select(|view| view.server_ids().len());
    let dropped = store.select(|view| view.server_ids().len());
    let copy = dropped.clone();
    let (count, callback) = counter();
    store.subscribe(|view| view.server("1").and_then(|s| s.ping), callback);
    assert_eq!(store.subscriber_count(), 3);

    drop(dropped);
    add(&mut store, server("1", "Alpha"));
    assert_eq!(store.subscriber_count(), 3, "a clone still holds the selection");
    assert_eq!(copy.get(), 1);

    drop(copy);
    add(&mut store, server("2", "Beta"));
    assert_eq!(store.subscriber_count(), 2);
    assert_eq!(kept.get(), 2);

    store
        .dispatch(StoreEvent::SetPing {
            id: "1".to_string(),
            ping: 5.0,
        })
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
