use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use common::{CreatePaymentRequest, CursorPage, PaymentFilter, UpdatePaymentRequest};
use model::entities::payment;
use rust_decimal::Decimal;
use serde::Serialize;
use service::{Operation, payments, payments::Settlement};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::handlers::installments::InstallmentResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Payment response model
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub user_id: i32,
    pub installment_id: i32,
    pub paid_at: NaiveDateTime,
    #[schema(value_type = String, example = "400.00")]
    pub amount: Decimal,
    /// `cash`, `transfer` or `mercado_pago`
    pub method: String,
    pub receipt: Option<String>,
    /// Administrator that registered the payment
    pub recorded_by: Option<i32>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            installment_id: model.installment_id,
            paid_at: model.paid_at,
            amount: model.amount,
            method: model.method.as_str().to_string(),
            receipt: model.receipt,
            recorded_by: model.recorded_by,
        }
    }
}

/// A payment together with the installment totals it left behind
#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementResponse {
    pub payment: PaymentResponse,
    pub installment: InstallmentResponse,
}

impl From<Settlement> for SettlementResponse {
    fn from((payment, installment): Settlement) -> Self {
        Self {
            payment: PaymentResponse::from(payment),
            installment: InstallmentResponse::from(installment),
        }
    }
}

/// Most recent payment with the payer's name
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestPaymentResponse {
    pub payment: PaymentResponse,
    pub payer_name: Option<String>,
}

/// Register a payment and apply it to its installment
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment registered successfully", body = ApiResponse<SettlementResponse>),
        (status = 400, description = "Invalid amount, method or payer", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_payment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<CreatePaymentRequest>>,
) -> ApiResult<SettlementResponse> {
    trace!("Entering create_payment function");
    identity.require(Operation::ManagePayments)?;

    let now = Utc::now().naive_utc();
    let (payment, installment) =
        payments::create(&state.db, request, Some(identity.user_id), now).await?;
    info!(
        "Payment {} of {} registered, installment {} is {}",
        payment.id,
        payment.amount,
        installment.id,
        installment.status.as_str()
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            SettlementResponse::from((payment, installment)),
            "Payment registered successfully",
        )),
    ))
}

/// Cursor listing of payments
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    params(PaymentFilter),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<CursorPage<PaymentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<CursorPage<PaymentResponse>> {
    identity.require(Operation::ViewPayments)?;

    let page = payments::list(&state.db, &filter).await?.map(PaymentResponse::from);
    debug!("Returning {} payments, next cursor {:?}", page.items.len(), page.next_cursor);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Payments retrieved successfully"))))
}

/// Most recent payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/latest",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Latest payment retrieved successfully", body = ApiResponse<LatestPaymentResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "No payments registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_latest_payment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<LatestPaymentResponse> {
    identity.require(Operation::ViewPayments)?;

    let (payment, payer) = payments::latest(&state.db).await?;
    let response = LatestPaymentResponse {
        payment: PaymentResponse::from(payment),
        payer_name: payer.map(|detail| format!("{} {}", detail.first_name, detail.last_name)),
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Latest payment retrieved successfully"))))
}

/// Payments of the authenticated student, newest first
#[utoipa::path(
    get,
    path = "/api/v1/payments/mine",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments retrieved successfully", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a student", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_my_payments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Vec<PaymentResponse>> {
    identity.require(Operation::ViewOwnPayments)?;

    let response: Vec<PaymentResponse> = payments::of_user(&state.db, identity.user_id)
        .await?
        .into_iter()
        .map(PaymentResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Payments retrieved successfully"))))
}

/// Edit a payment and re-apply it to its installment
#[utoipa::path(
    patch,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    request_body = UpdatePaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment updated successfully", body = ApiResponse<SettlementResponse>),
        (status = 400, description = "Invalid amount or method", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_payment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(payment_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdatePaymentRequest>>,
) -> ApiResult<SettlementResponse> {
    identity.require(Operation::ManagePayments)?;

    let settlement = payments::update(&state.db, payment_id, request).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(SettlementResponse::from(settlement), "Payment updated successfully")),
    ))
}

/// Delete a payment and revert it from its installment
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment deleted, updated installment returned", body = ApiResponse<InstallmentResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(payment_id): Path<i32>,
) -> ApiResult<InstallmentResponse> {
    identity.require(Operation::ManagePayments)?;

    let installment = payments::delete(&state.db, payment_id).await?;
    info!("Payment {} deleted", payment_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(InstallmentResponse::from(installment), "Payment deleted successfully")),
    ))
}
