use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use common::{CreateEnrollmentRequest, EnrollmentPair, Page, PageQuery, PageRequest, UpdateEnrollmentRequest};
use model::entities::enrollment;
use serde::Serialize;
use service::{Operation, enrollments::{self, EnrollmentView}};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Enrollment response model. Student and subject names are filled in listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: i32,
    pub user_id: i32,
    pub subject_id: i32,
    pub state: String,
    pub grade: Option<i32>,
    pub enrolled_on: NaiveDate,
    pub year_taken: i32,
    pub student_name: Option<String>,
    pub subject_name: Option<String>,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(model: enrollment::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            subject_id: model.subject_id,
            state: model.state,
            grade: model.grade,
            enrolled_on: model.enrolled_on,
            year_taken: model.year_taken,
            student_name: None,
            subject_name: None,
        }
    }
}

impl From<EnrollmentView> for EnrollmentResponse {
    fn from(view: EnrollmentView) -> Self {
        Self {
            student_name: view
                .student
                .map(|student| format!("{} {}", student.first_name, student.last_name)),
            subject_name: view.subject.map(|subject| subject.name),
            ..Self::from(view.enrollment)
        }
    }
}

/// Enroll a student in a subject
#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    request_body = CreateEnrollmentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Enrollment created successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 400, description = "Invalid request or student already enrolled", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not manage enrollments", body = ErrorResponse),
        (status = 404, description = "User or subject not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<CreateEnrollmentRequest>>,
) -> ApiResult<EnrollmentResponse> {
    trace!("Entering create_enrollment function");
    identity.require(Operation::ManageEnrollments)?;

    let today = Utc::now().date_naive();
    let created = enrollments::enroll(&state.db, request, today).await?;
    info!(
        "User {} enrolled in subject {} (enrollment {})",
        created.user_id, created.subject_id, created.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(EnrollmentResponse::from(created), "Enrollment created successfully")),
    ))
}

/// Offset listing of every enrollment, with student and subject
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    params(PageQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = ApiResponse<Page<EnrollmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view enrollments", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Query(query)): Valid<Query<PageQuery>>,
) -> ApiResult<Page<EnrollmentResponse>> {
    identity.require(Operation::ViewEnrollments)?;

    let request = PageRequest::from(query);
    let page = enrollments::search(&state.db, &request)
        .await?
        .map(EnrollmentResponse::from);
    debug!("Returning {} of {} enrollments", page.items.len(), page.total);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Enrollments retrieved successfully"))))
}

/// Update the enrollment of a `(user_id, subject_id)` pair
#[utoipa::path(
    patch,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    request_body = UpdateEnrollmentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollment updated successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not manage enrollments", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_enrollment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<UpdateEnrollmentRequest>>,
) -> ApiResult<EnrollmentResponse> {
    identity.require(Operation::ManageEnrollments)?;

    let updated = enrollments::update(&state.db, request).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(EnrollmentResponse::from(updated), "Enrollment updated successfully")),
    ))
}

/// Delete the enrollment of a `(user_id, subject_id)` pair
#[utoipa::path(
    delete,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    params(EnrollmentPair),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollment deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not manage enrollments", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Query(pair): Query<EnrollmentPair>,
) -> ApiResult<String> {
    identity.require(Operation::ManageEnrollments)?;

    enrollments::delete(&state.db, pair).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("User {} unenrolled from subject {}", pair.user_id, pair.subject_id),
            "Enrollment deleted successfully",
        )),
    ))
}
