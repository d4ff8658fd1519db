use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use thiserror::Error;

use crate::models::deal::DEFAULT_MIN_PROFIT;
use crate::models::{compute_deals, Deal};
use crate::server::ApiState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    #[serde(rename = "minProfit", alias = "min_profit")]
    pub min_profit: Option<f64>,
}

/// GET /deals
pub async fn get_deals(
    State(state): State<ApiState>,
    Query(params): Query<DealsQuery>,
) -> Result<Json<Vec<Deal>>, ApiError> {
    let min_profit = params.min_profit.unwrap_or(DEFAULT_MIN_PROFIT);
    let items = state.store.get_all_items().await?;
    Ok(Json(compute_deals(&items, min_profit)))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
