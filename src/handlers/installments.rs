use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::CreateInstallmentRequest;
use model::entities::installment;
use rust_decimal::Decimal;
use serde::Serialize;
use service::{Operation, ServiceError, installments};
use tracing::{info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Installment response model
#[derive(Debug, Serialize, ToSchema)]
pub struct InstallmentResponse {
    pub id: i32,
    pub user_id: i32,
    pub period: String,
    pub due_date: NaiveDate,
    #[schema(value_type = String, example = "1000.00")]
    pub amount_due: Decimal,
    #[schema(value_type = String, example = "800.00")]
    pub paid_amount: Decimal,
    #[schema(value_type = String, example = "200.00")]
    pub balance: Decimal,
    /// `pending`, `partial` or `paid`
    pub status: String,
    /// Whether a due-date reminder was already generated
    pub notified: bool,
}

impl From<installment::Model> for InstallmentResponse {
    fn from(model: installment::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            period: model.period,
            due_date: model.due_date,
            amount_due: model.amount_due,
            paid_amount: model.paid_amount,
            balance: model.balance,
            status: model.status.as_str().to_string(),
            notified: model.notified,
        }
    }
}

/// Bill a student for one period
#[utoipa::path(
    post,
    path = "/api/v1/installments",
    tag = "installments",
    request_body = CreateInstallmentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Installment created successfully", body = ApiResponse<InstallmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_installment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<CreateInstallmentRequest>>,
) -> ApiResult<InstallmentResponse> {
    trace!("Entering create_installment function");
    identity.require(Operation::ManageInstallments)?;

    let created = installments::create(&state.db, request).await?;
    info!("Installment {} created for user {}", created.id, created.user_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(InstallmentResponse::from(created), "Installment created successfully")),
    ))
}

/// Get an installment. Students may only read their own.
#[utoipa::path(
    get,
    path = "/api/v1/installments/{installment_id}",
    tag = "installments",
    params(
        ("installment_id" = i32, Path, description = "Installment ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Installment retrieved successfully", body = ApiResponse<InstallmentResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Installment not found or owned by another student", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_installment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(installment_id): Path<i32>,
) -> ApiResult<InstallmentResponse> {
    let found = installments::get(&state.db, installment_id).await?;
    // Other students' installments answer exactly like missing ones
    if identity.require_self_or(Operation::ViewInstallment, found.user_id).is_err() {
        warn!("User {} may not read installment {}", identity.user_id, installment_id);
        return Err(ServiceError::not_found("Installment", installment_id).into());
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(InstallmentResponse::from(found), "Installment retrieved successfully")),
    ))
}
