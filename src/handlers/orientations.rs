use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CreateOrientationRequest, Page, PageQuery, PageRequest, UpdateOrientationRequest};
use model::entities::orientation;
use serde::Serialize;
use service::{Operation, enrollments, orientations};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::handlers::enrollments::EnrollmentResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Orientation response model
#[derive(Debug, Serialize, ToSchema)]
pub struct OrientationResponse {
    pub id: i32,
    pub name: String,
    /// `active` or `inactive`
    pub status: String,
}

impl From<orientation::Model> for OrientationResponse {
    fn from(model: orientation::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            status: model.status.as_str().to_string(),
        }
    }
}

/// Create a new orientation
#[utoipa::path(
    post,
    path = "/api/v1/orientations",
    tag = "orientations",
    request_body = CreateOrientationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Orientation created successfully", body = ApiResponse<OrientationResponse>),
        (status = 400, description = "Invalid request or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_orientation(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<CreateOrientationRequest>>,
) -> ApiResult<OrientationResponse> {
    trace!("Entering create_orientation function");
    identity.require(Operation::ManageOrientations)?;

    let created = orientations::create(&state.db, request).await?;
    info!("Orientation created with ID: {}, name: {}", created.id, created.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(OrientationResponse::from(created), "Orientation created successfully")),
    ))
}

/// List active orientations
#[utoipa::path(
    get,
    path = "/api/v1/orientations",
    tag = "orientations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orientations retrieved successfully", body = ApiResponse<Vec<OrientationResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_orientations(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Vec<OrientationResponse>> {
    identity.require(Operation::ViewOrientations)?;

    let response: Vec<OrientationResponse> = orientations::list_active(&state.db)
        .await?
        .into_iter()
        .map(OrientationResponse::from)
        .collect();
    debug!("Returning {} active orientations", response.len());
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Orientations retrieved successfully"))))
}

/// Offset search over orientations
#[utoipa::path(
    post,
    path = "/api/v1/orientations/search",
    tag = "orientations",
    request_body = PageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orientations retrieved successfully", body = ApiResponse<Page<OrientationResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_orientations(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<PageRequest>>,
) -> ApiResult<Page<OrientationResponse>> {
    identity.require(Operation::ViewOrientations)?;

    let page = orientations::search(&state.db, &request)
        .await?
        .map(OrientationResponse::from);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Orientations retrieved successfully"))))
}

/// Get an orientation by ID
#[utoipa::path(
    get,
    path = "/api/v1/orientations/{orientation_id}",
    tag = "orientations",
    params(
        ("orientation_id" = i32, Path, description = "Orientation ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orientation retrieved successfully", body = ApiResponse<OrientationResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_orientation(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(orientation_id): Path<i32>,
) -> ApiResult<OrientationResponse> {
    identity.require(Operation::ViewOrientations)?;

    let found = orientations::get(&state.db, orientation_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(OrientationResponse::from(found), "Orientation retrieved successfully")),
    ))
}

/// Rename an orientation or change its status
#[utoipa::path(
    patch,
    path = "/api/v1/orientations/{orientation_id}",
    tag = "orientations",
    params(
        ("orientation_id" = i32, Path, description = "Orientation ID"),
    ),
    request_body = UpdateOrientationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orientation updated successfully", body = ApiResponse<OrientationResponse>),
        (status = 400, description = "Invalid status or duplicate name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_orientation(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(orientation_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateOrientationRequest>>,
) -> ApiResult<OrientationResponse> {
    identity.require(Operation::ManageOrientations)?;

    let updated = orientations::update(&state.db, orientation_id, request).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(OrientationResponse::from(updated), "Orientation updated successfully")),
    ))
}

/// Delete an orientation (marks it inactive)
#[utoipa::path(
    delete,
    path = "/api/v1/orientations/{orientation_id}",
    tag = "orientations",
    params(
        ("orientation_id" = i32, Path, description = "Orientation ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orientation deleted successfully", body = ApiResponse<OrientationResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_orientation(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(orientation_id): Path<i32>,
) -> ApiResult<OrientationResponse> {
    identity.require(Operation::ManageOrientations)?;

    let deleted = orientations::delete(&state.db, orientation_id).await?;
    info!("Orientation {} is now {}", deleted.id, deleted.status.as_str());
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(OrientationResponse::from(deleted), "Orientation deleted successfully")),
    ))
}

/// Enrollments in the subjects of an orientation
#[utoipa::path(
    get,
    path = "/api/v1/orientations/{orientation_id}/enrollments",
    tag = "orientations",
    params(
        ("orientation_id" = i32, Path, description = "Orientation ID"),
        PageQuery,
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = ApiResponse<Page<EnrollmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view enrollments", body = ErrorResponse),
        (status = 404, description = "Orientation not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_orientation_enrollments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(orientation_id): Path<i32>,
    Valid(Query(query)): Valid<Query<PageQuery>>,
) -> ApiResult<Page<EnrollmentResponse>> {
    identity.require(Operation::ViewOrientationEnrollments)?;

    let request = PageRequest::from(query);
    let page = enrollments::of_orientation(&state.db, orientation_id, &request)
        .await?
        .map(EnrollmentResponse::from);
    debug!("Orientation {} has {} enrollments", orientation_id, page.total);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Enrollments retrieved successfully"))))
}
