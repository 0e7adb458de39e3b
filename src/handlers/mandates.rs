use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{AccountType, Frequency};
use crate::error::AppError;
use crate::services::CreateMandate;
use crate::validation::ValidationError;
use crate::AppState;

/// Strict creation payload; unknown fields are rejected at the boundary.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMandateRequest {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub branch_code: String,
    pub account_type: AccountType,
    pub max_amount: BigDecimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<CreateMandateRequest> for CreateMandate {
    fn from(request: CreateMandateRequest) -> Self {
        CreateMandate {
            user_id: request.user_id,
            organization_id: request.organization_id,
            bank_name: request.bank_name,
            account_holder: request.account_holder,
            account_number: request.account_number,
            branch_code: request.branch_code,
            account_type: request.account_type,
            max_amount: request.max_amount,
            frequency: request.frequency,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MandateListQuery {
    pub organization_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

pub async fn create_mandate(
    State(state): State<AppState>,
    Json(request): Json<CreateMandateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.create_mandate(request.into()).await?;
    Ok((StatusCode::CREATED, Json(mandate)))
}

pub async fn list_mandates(
    State(state): State<AppState>,
    Query(query): Query<MandateListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mandates = match (query.user_id, query.organization_id) {
        (Some(user_id), organization_id) => {
            state
                .mandates
                .mandates_for_user(user_id, organization_id)
                .await?
        }
        (None, Some(organization_id)) => {
            state
                .mandates
                .mandates_for_organization(organization_id)
                .await?
        }
        (None, None) => {
            return Err(AppError::Validation(vec![ValidationError::new(
                "organization_id",
                "either organization_id or user_id is required",
            )]));
        }
    };

    Ok(Json(mandates))
}

pub async fn get_mandate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.get_mandate(id).await?;
    Ok(Json(mandate))
}

pub async fn activate_mandate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.activate_mandate(id).await?;
    Ok(Json(mandate))
}

pub async fn suspend_mandate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.suspend_mandate(id).await?;
    Ok(Json(mandate))
}

pub async fn resume_mandate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.resume_mandate(id).await?;
    Ok(Json(mandate))
}

pub async fn cancel_mandate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mandate = state.mandates.cancel_mandate(id).await?;
    Ok(Json(mandate))
}

pub async fn mandate_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state.mandates.mandate_form(id).await?;
    Ok(Html(document))
}
