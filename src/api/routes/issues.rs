use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::{error::ApiError, state::AppState};
use crate::domain::{BatchReport, IssueResolution, Record, RecordId};
use crate::infrastructure::parse_issue_csv;

pub async fn create_issue(
    State(state): State<AppState>,
    Json(request): Json<IssueResolution>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let record = state.knowledge.add_record(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_issues(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.knowledge.list_all().await?))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.knowledge.get(&RecordId::from_raw(id)).await?))
}

pub async fn reset_issues(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.knowledge.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn import_batch(
    State(state): State<AppState>,
    Json(rows): Json<Vec<IssueResolution>>,
) -> Result<Json<BatchReport>, ApiError> {
    Ok(Json(state.knowledge.add_records(rows).await?))
}

/// Accepts a raw CSV body with `issue` and `resolution` columns.
pub async fn import_csv(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<BatchReport>, ApiError> {
    let rows = parse_issue_csv(body.as_bytes())?;
    tracing::info!(rows = rows.len(), "CSV upload parsed");
    Ok(Json(state.knowledge.add_records(rows).await?))
}
