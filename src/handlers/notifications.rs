use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use common::{CursorPage, CursorQuery};
use model::entities::notification;
use serde::Serialize;
use service::{Operation, notifications};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub user_id: i32,
    pub installment_id: i32,
    pub kind: String,
    /// `student` or `admin`
    pub recipient: String,
    pub message: String,
    pub sent_at: NaiveDateTime,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            installment_id: model.installment_id,
            kind: model.kind,
            recipient: model.recipient.as_str().to_string(),
            message: model.message,
            sent_at: model.sent_at,
        }
    }
}

/// Generate reminders for installments due after the configured lead time
#[utoipa::path(
    post,
    path = "/api/v1/notifications/reminders",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reminders generated", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate_reminders(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Vec<NotificationResponse>> {
    identity.require(Operation::GenerateReminders)?;

    let now = Utc::now().naive_utc();
    let created = notifications::generate_reminders(
        &state.db,
        now.date(),
        state.settings.reminder_days_ahead,
        now,
    )
    .await?;
    info!("User {} generated {} reminders", identity.user_id, created.len());

    let response: Vec<NotificationResponse> =
        created.into_iter().map(NotificationResponse::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Reminders generated"))))
}

/// Notifications addressed to the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/notifications/mine",
    tag = "notifications",
    params(CursorQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = ApiResponse<CursorPage<NotificationResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_my_notifications(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Query(query)): Valid<Query<CursorQuery>>,
) -> ApiResult<CursorPage<NotificationResponse>> {
    identity.require(Operation::ViewOwnNotifications)?;

    let page = notifications::list_for(&state.db, &identity, &query)
        .await?
        .map(NotificationResponse::from);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Notifications retrieved successfully"))))
}
