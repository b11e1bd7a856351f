use std::thread;

use path_matrix_core::contract::RefreshResponse;
use path_matrix_core::test_helpers::{InMemoryTableStore, FIXTURE_GRAPH};
use path_matrix_lambda::config::HandlerConfig;
use path_matrix_lambda::handlers::refresh::{handle_refresh_event, PathTableRefresher};
use serde_json::json;

#[test]
fn successive_requests_replace_previous_vertex_set() {
    let store = InMemoryTableStore::new();
    let refresher = PathTableRefresher::new(&store, HandlerConfig::default());

    let first = handle_refresh_event(json!({"graph": FIXTURE_GRAPH}), &refresher);
    let second = handle_refresh_event(json!({"graph": "Urbana->Champaign"}), &refresher);

    assert_eq!(first, RefreshResponse::ok());
    assert_eq!(second, RefreshResponse::ok());
    let rows = store.rows("paths");
    assert_eq!(rows.len(), 4);
    assert_eq!(store.distance("paths", "Urbana", "Champaign"), Some(1));
    assert_eq!(store.distance("paths", "Chicago", "Chicago"), None);
}

#[test]
fn table_is_created_once_and_reused() {
    let store = InMemoryTableStore::new();
    let refresher = PathTableRefresher::new(&store, HandlerConfig::default());

    for _ in 0..3 {
        let response = handle_refresh_event(json!({"graph": FIXTURE_GRAPH}), &refresher);
        assert!(response.is_success());
    }

    assert_eq!(store.ensure_calls(), 3);
    assert_eq!(store.rows("paths").len(), 16);
}

#[test]
fn overlapping_refreshes_do_not_interleave() {
    let store = InMemoryTableStore::new().with_max_batch_size(2);
    let refresher = PathTableRefresher::new(&store, HandlerConfig::default());
    let graphs = [FIXTURE_GRAPH, "a->b,b->c,c->a"];

    thread::scope(|scope| {
        let refresher = &refresher;
        let handles: Vec<_> = graphs
            .into_iter()
            .map(|graph| {
                scope.spawn(move || handle_refresh_event(json!({ "graph": graph }), refresher))
            })
            .collect();
        for handle in handles {
            let response = handle.join().expect("refresh thread should not panic");
            assert!(response.is_success());
        }
    });

    // Whichever refresh ran last owns the whole table.
    let rows = store.rows("paths");
    let fixture_rows = rows.iter().filter(|row| row.source == "Chicago").count();
    let cycle_rows = rows.iter().filter(|row| row.source == "a").count();
    assert!(
        (rows.len() == 16 && fixture_rows == 4 && cycle_rows == 0)
            || (rows.len() == 9 && cycle_rows == 3 && fixture_rows == 0),
        "table mixes both graphs: {rows:?}"
    );
}

#[test]
fn write_failure_reports_fixed_error_and_table_stays_partial() {
    let store = InMemoryTableStore::new()
        .with_max_batch_size(10)
        .with_put_failure_after(1);
    let refresher = PathTableRefresher::new(&store, HandlerConfig::default());

    let response = handle_refresh_event(json!({"graph": FIXTURE_GRAPH}), &refresher);

    assert_eq!(
        serde_json::to_value(&response).expect("response should serialize"),
        json!({"statusCode": 500, "body": "\"Failed to connect to the dynamodb\""})
    );
    assert_eq!(store.rows("paths").len(), 10);
}

#[test]
fn unavailable_store_reports_fixed_error() {
    let store = InMemoryTableStore::new().with_ensure_failure("LimitExceededException");
    let refresher = PathTableRefresher::new(&store, HandlerConfig::default());

    let response = handle_refresh_event(json!({"body": {"graph": FIXTURE_GRAPH}}), &refresher);

    assert_eq!(response, RefreshResponse::failure());
    assert!(!store.table_exists("paths"));
}

#[test]
fn dedicated_worker_pool_is_honoured() {
    let store = InMemoryTableStore::new();
    let config = HandlerConfig {
        distance_workers: Some(2),
        ..HandlerConfig::default()
    };
    let refresher = PathTableRefresher::new(&store, config);

    let response = handle_refresh_event(json!({"graph": FIXTURE_GRAPH}), &refresher);

    assert!(response.is_success());
    assert_eq!(store.distance("paths", "Lafayette", "Springfield"), Some(-1));
}
