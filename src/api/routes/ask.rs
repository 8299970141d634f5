use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::{QueryResult, SearchResult};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let results = match request.limit {
        Some(limit) => state.rag.retrieve_top_k(&request.query, limit.max(1)).await?,
        None => state.rag.retrieve(&request.query).await?,
    };
    Ok(Json(results))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    Ok(Json(state.rag.answer(&request.question).await?))
}
