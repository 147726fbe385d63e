//! Out-of-band operational triggers.
//!
//! `/ops/activate` and `/ops/tick` are the two manual recovery entry points
//! for activation: the first runs the activation task alone, the second the
//! full lifecycle tick. Both are idempotent because every task re-queries
//! its eligible set. `/ops/errors` surfaces the error-record stream.

use std::sync::Arc;

use axum::extract::{Extension, Query as HttpQuery};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use gigboard_core::RunId;
use gigboard_infra::{collections, ErrorRecord, Query, RunReport, TaskKind};

use crate::app::{errors, AppServices};

pub async fn activate(Extension(services): Extension<Arc<AppServices>>) -> Response {
    run_blocking(move || {
        services
            .runner
            .run_task(TaskKind::ActivateStagedJobs, RunId::new())
    })
    .await
}

pub async fn tick(Extension(services): Extension<Arc<AppServices>>) -> Response {
    run_blocking(move || services.runner.run_lifecycle_tick(RunId::new())).await
}

async fn run_blocking<F>(run: F) -> Response
where
    F: FnOnce() -> RunReport + Send + 'static,
{
    match tokio::task::spawn_blocking(run).await {
        Ok(report) => report_response(report),
        Err(err) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "task_panic", err.to_string()),
    }
}

fn report_response(report: RunReport) -> Response {
    let tasks: Vec<JsonValue> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(count) => json!({ "task": outcome.task.name(), "ok": true, "count": count }),
            Err(err) => json!({ "task": outcome.task.name(), "ok": false, "error": err.to_string() }),
        })
        .collect();

    let status = if report.all_succeeded() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(json!({
            "run_id": report.run_id.to_string(),
            "duration_ms": report.duration.as_millis() as u64,
            "tasks": tasks,
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ErrorListParams {
    pub limit: Option<usize>,
}

/// Recent task failures, newest first.
pub async fn recent_errors(
    Extension(services): Extension<Arc<AppServices>>,
    HttpQuery(params): HttpQuery<ErrorListParams>,
) -> Response {
    let result =
        tokio::task::spawn_blocking(move || services.store.query(collections::TASK_ERRORS, &Query::all()))
            .await;

    match result {
        Ok(Ok(docs)) => {
            let mut records: Vec<ErrorRecord> = docs
                .iter()
                .filter_map(|doc| serde_json::from_value(doc.data.clone()).ok())
                .collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            records.truncate(params.limit.unwrap_or(50));
            Json(json!({ "errors": records })).into_response()
        }
        Ok(Err(err)) => {
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
        Err(err) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "task_panic", err.to_string()),
    }
}
