use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CreateSubjectRequest, Page, PageRequest, UpdateSubjectRequest};
use model::entities::subject;
use serde::Serialize;
use service::{Operation, enrollments, subjects, subjects::SubjectWithOrientation};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::handlers::enrollments::EnrollmentResponse;
use crate::handlers::orientations::OrientationResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Subject response model
#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectResponse {
    pub id: i32,
    pub name: String,
    pub orientation_id: i32,
    pub year: i32,
}

impl From<subject::Model> for SubjectResponse {
    fn from(model: subject::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            orientation_id: model.orientation_id,
            year: model.year,
        }
    }
}

/// Subject with its orientation
#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectDetailResponse {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub orientation: Option<OrientationResponse>,
}

impl From<SubjectWithOrientation> for SubjectDetailResponse {
    fn from((subject, orientation): SubjectWithOrientation) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            year: subject.year,
            orientation: orientation.map(OrientationResponse::from),
        }
    }
}

/// Create a new subject
#[utoipa::path(
    post,
    path = "/api/v1/subjects",
    tag = "subjects",
    request_body = CreateSubjectRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Subject created successfully", body = ApiResponse<SubjectResponse>),
        (status = 400, description = "Invalid request or duplicate subject", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_subject(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<CreateSubjectRequest>>,
) -> ApiResult<SubjectResponse> {
    trace!("Entering create_subject function");
    identity.require(Operation::ManageSubjects)?;

    let created = subjects::create(&state.db, request).await?;
    info!("Subject created with ID: {}, name: {}", created.id, created.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SubjectResponse::from(created), "Subject created successfully")),
    ))
}

/// List all subjects
#[utoipa::path(
    get,
    path = "/api/v1/subjects",
    tag = "subjects",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subjects retrieved successfully", body = ApiResponse<Vec<SubjectResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view subjects", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_subjects(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Vec<SubjectResponse>> {
    identity.require(Operation::ViewSubjects)?;

    let response: Vec<SubjectResponse> = subjects::list(&state.db)
        .await?
        .into_iter()
        .map(SubjectResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Subjects retrieved successfully"))))
}

/// List all subjects with their orientation
#[utoipa::path(
    get,
    path = "/api/v1/subjects/detailed",
    tag = "subjects",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subjects retrieved successfully", body = ApiResponse<Vec<SubjectDetailResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view subjects", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_subjects_detailed(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Vec<SubjectDetailResponse>> {
    identity.require(Operation::ViewSubjects)?;

    let response: Vec<SubjectDetailResponse> = subjects::list_detailed(&state.db)
        .await?
        .into_iter()
        .map(SubjectDetailResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Subjects retrieved successfully"))))
}

/// Offset search over subjects
#[utoipa::path(
    post,
    path = "/api/v1/subjects/search",
    tag = "subjects",
    request_body = PageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subjects retrieved successfully", body = ApiResponse<Page<SubjectDetailResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view subjects", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_subjects(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<PageRequest>>,
) -> ApiResult<Page<SubjectDetailResponse>> {
    identity.require(Operation::ViewSubjects)?;

    let page = subjects::search(&state.db, &request)
        .await?
        .map(SubjectDetailResponse::from);
    debug!("Subject search matched {} rows", page.total);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Subjects retrieved successfully"))))
}

/// Get a subject with its orientation
#[utoipa::path(
    get,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(
        ("subject_id" = i32, Path, description = "Subject ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subject retrieved successfully", body = ApiResponse<SubjectDetailResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view subjects", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subject(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(subject_id): Path<i32>,
) -> ApiResult<SubjectDetailResponse> {
    identity.require(Operation::ViewSubjects)?;

    let found = subjects::get_detailed(&state.db, subject_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(SubjectDetailResponse::from(found), "Subject retrieved successfully")),
    ))
}

/// Roster of a subject
#[utoipa::path(
    get,
    path = "/api/v1/subjects/{subject_id}/enrollments",
    tag = "subjects",
    params(
        ("subject_id" = i32, Path, description = "Subject ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roster retrieved successfully", body = ApiResponse<Vec<EnrollmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view subjects", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subject_enrollments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(subject_id): Path<i32>,
) -> ApiResult<Vec<EnrollmentResponse>> {
    identity.require(Operation::ViewSubjects)?;

    let response: Vec<EnrollmentResponse> = enrollments::of_subject(&state.db, subject_id)
        .await?
        .into_iter()
        .map(EnrollmentResponse::from)
        .collect();
    debug!("Subject {} has {} students", subject_id, response.len());
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Roster retrieved successfully"))))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(
        ("subject_id" = i32, Path, description = "Subject ID"),
    ),
    request_body = UpdateSubjectRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subject updated successfully", body = ApiResponse<SubjectResponse>),
        (status = 400, description = "Invalid request or duplicate subject", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Subject or orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_subject(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(subject_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateSubjectRequest>>,
) -> ApiResult<SubjectResponse> {
    identity.require(Operation::ManageSubjects)?;

    let updated = subjects::update(&state.db, subject_id, request).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(SubjectResponse::from(updated), "Subject updated successfully")),
    ))
}

/// Delete a subject and its enrollments
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(
        ("subject_id" = i32, Path, description = "Subject ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subject deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(subject_id): Path<i32>,
) -> ApiResult<String> {
    identity.require(Operation::ManageSubjects)?;

    subjects::delete(&state.db, subject_id).await?;
    info!("Subject with ID {} deleted successfully", subject_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(format!("Subject {} deleted", subject_id), "Subject deleted successfully")),
    ))
}
