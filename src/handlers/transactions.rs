use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::TransactionStatus;
use crate::error::AppError;
use crate::ports::TransactionFilter;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub mandate_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let defaults = TransactionFilter::default();
    let filter = TransactionFilter {
        mandate_id: query.mandate_id,
        status: query.status,
        limit: query.limit.unwrap_or(defaults.limit),
        offset: query.offset.unwrap_or(defaults.offset),
    };

    let transactions = state.transactions.list(filter).await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state.transactions.get(id).await?;
    Ok(Json(transaction))
}
