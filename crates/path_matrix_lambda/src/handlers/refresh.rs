use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use path_matrix_core::contract::{graph_fingerprint, RefreshRequest, RefreshResponse};
use path_matrix_core::graph::{parse_edge_list, GraphParseError};
use path_matrix_core::materialize::{
    materialize, MaterializeError, MaterializeOptions, MaterializeReport,
};
use path_matrix_core::store::{DistanceTableStore, StoreError};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::HandlerConfig;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("malformed graph: {0}")]
    MalformedInput(#[from] GraphParseError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("materialization failed: {0}")]
    Materialize(#[from] MaterializeError),
}

impl RefreshError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::MalformedInput(_) => "malformed_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Materialize(MaterializeError::Store(StoreError::PartialWrite { .. })) => {
                "partial_write"
            }
            Self::Materialize(_) => "materialize_failed",
        }
    }
}

/// Drives one table refresh per request against a single store.
///
/// Refreshes issued through the same refresher are serialized, so their
/// clear and repopulate phases never interleave. Writers in other processes
/// are not coordinated.
pub struct PathTableRefresher<S> {
    store: S,
    config: HandlerConfig,
    guard: Mutex<()>,
}

impl<S: DistanceTableStore> PathTableRefresher<S> {
    pub fn new(store: S, config: HandlerConfig) -> Self {
        Self {
            store,
            config,
            guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn refresh(&self, request: &RefreshRequest) -> Result<MaterializeReport, RefreshError> {
        let parsed = parse_edge_list(&request.graph)?;
        tracing::info!(
            component = "refresh_handler",
            event = "graph_parsed",
            graph_fingerprint = %graph_fingerprint(&request.graph),
            vertex_count = parsed.vertices.len(),
            edge_count = parsed.graph.edge_count(),
        );

        // The lock guards no data, so a poisoned lock is still usable.
        let _refresh_lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let provision = self
            .store
            .ensure_table(&self.config.table_name)
            .map_err(RefreshError::StoreUnavailable)?;
        tracing::info!(
            component = "refresh_handler",
            event = "table_ready",
            table = %self.config.table_name,
            created = provision.was_created(),
        );
        let table = provision.into_handle();

        let report = materialize(
            &self.store,
            &table,
            &parsed.vertices,
            &parsed.graph,
            MaterializeOptions {
                distance_workers: self.config.distance_workers,
            },
        )?;
        Ok(report)
    }
}

/// Entry point for a raw Lambda event.
///
/// Accepts `{"graph": "..."}` directly or wrapped in an API Gateway proxy
/// `body`. Every failure collapses into the same fixed 500 response; the
/// cause only reaches the logs.
pub fn handle_refresh_event<S: DistanceTableStore>(
    event: Value,
    refresher: &PathTableRefresher<S>,
) -> RefreshResponse {
    let started_at = Instant::now();
    tracing::info!(
        component = "refresh_handler",
        event = "refresh_started",
        table = %refresher.config().table_name,
    );

    let outcome = decode_request(event).and_then(|request| refresher.refresh(&request));

    match outcome {
        Ok(report) => {
            tracing::info!(
                component = "refresh_handler",
                event = "refresh_completed",
                vertex_count = report.vertex_count,
                rows_deleted = report.rows_deleted,
                rows_written = report.rows_written,
                duration_ms = started_at.elapsed().as_millis() as u64,
            );
            RefreshResponse::ok()
        }
        Err(error) => {
            tracing::error!(
                component = "refresh_handler",
                event = "refresh_failed",
                error_kind = error.kind(),
                error = %error,
                duration_ms = started_at.elapsed().as_millis() as u64,
            );
            RefreshResponse::failure()
        }
    }
}

fn decode_request(event: Value) -> Result<RefreshRequest, RefreshError> {
    let payload = normalize_apigw_event(event).map_err(RefreshError::MalformedRequest)?;
    serde_json::from_value(payload)
        .map_err(|error| RefreshError::MalformedRequest(error.to_string()))
}

fn normalize_apigw_event(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    if object.contains_key("graph") {
        return Ok(event);
    }
    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}
