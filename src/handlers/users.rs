use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CursorPage, CursorQuery, Page, PageRequest, RegisterUserRequest, UpdateUserDetailsRequest};
use model::entities::user_detail;
use serde::Serialize;
use service::{Operation, enrollments, installments, users as user_service, users::UserWithDetail};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::handlers::enrollments::EnrollmentResponse;
use crate::handlers::installments::InstallmentResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Personal details of a user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailResponse {
    pub id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub document_id: String,
    pub email: String,
    /// `Student`, `Admin` or `Supervisor`
    pub role: String,
    pub school_year: Option<i32>,
    pub orientation_id: Option<i32>,
}

impl From<user_detail::Model> for UserDetailResponse {
    fn from(model: user_detail::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            first_name: model.first_name,
            last_name: model.last_name,
            document_id: model.document_id,
            email: model.email,
            role: model.role.as_str().to_string(),
            school_year: model.school_year,
            orientation_id: model.orientation_id,
        }
    }
}

/// User response model. The stored credential is never returned.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub detail: Option<UserDetailResponse>,
}

impl From<UserWithDetail> for UserResponse {
    fn from((user, detail): UserWithDetail) -> Self {
        Self {
            id: user.id,
            username: user.username,
            detail: detail.map(UserDetailResponse::from),
        }
    }
}

/// Name of the most recently registered user
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestUserResponse {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Register a new user together with its personal details
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = RegisterUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or duplicate username/email", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register_user(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<RegisterUserRequest>>,
) -> ApiResult<UserResponse> {
    trace!("Entering register_user function");
    identity.require(Operation::RegisterUser)?;
    debug!("Registering user with username: {}", request.username);

    let (user, detail) = user_service::register(&state.db, request).await?;
    info!("User registered with ID: {}, username: {}", user.id, user.username);

    let response = ApiResponse::ok(
        UserResponse::from((user, Some(detail))),
        "User registered successfully",
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Cursor listing of users with their details
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(CursorQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<CursorPage<UserResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not list users", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Query(query)): Valid<Query<CursorQuery>>,
) -> ApiResult<CursorPage<UserResponse>> {
    trace!("Entering list_users function");
    identity.require(Operation::ListUsers)?;

    let page = user_service::list(&state.db, &query).await?.map(UserResponse::from);
    debug!("Returning {} users, next cursor {:?}", page.items.len(), page.next_cursor);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Users retrieved successfully"))))
}

/// Offset search over students
#[utoipa::path(
    post,
    path = "/api/v1/users/students/search",
    tag = "users",
    request_body = PageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Students retrieved successfully", body = ApiResponse<Page<UserDetailResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not search students", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_students(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Valid(Json(request)): Valid<Json<PageRequest>>,
) -> ApiResult<Page<UserDetailResponse>> {
    identity.require(Operation::SearchStudents)?;

    let page = user_service::search_students(&state.db, &request)
        .await?
        .map(UserDetailResponse::from);
    debug!("Student search matched {} rows", page.total);
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Students retrieved successfully"))))
}

/// Profile of the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Caller no longer exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<UserResponse> {
    identity.require(Operation::ViewOwnProfile)?;

    let user = user_service::get(&state.db, identity.user_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(UserResponse::from(user), "Profile retrieved successfully")),
    ))
}

/// Name of the newest registered user
#[utoipa::path(
    get,
    path = "/api/v1/users/latest",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Latest user retrieved successfully", body = ApiResponse<LatestUserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "No users registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_latest_user(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<LatestUserResponse> {
    identity.require(Operation::ViewLatestUser)?;

    let detail = user_service::latest(&state.db).await?;
    let response = LatestUserResponse {
        user_id: detail.user_id,
        first_name: detail.first_name,
        last_name: detail.last_name,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Latest user retrieved successfully"))))
}

/// Get a user with its details
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<i32>,
) -> ApiResult<UserResponse> {
    trace!("Entering get_user function for user_id: {}", user_id);
    identity.require(Operation::ViewUser)?;

    let user = user_service::get(&state.db, user_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(UserResponse::from(user), "User retrieved successfully")),
    ))
}

/// Partially update a user's details
///
/// Non-administrators may only update their own details and cannot change their role.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/details",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserDetailsRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Details updated successfully", body = ApiResponse<UserDetailResponse>),
        (status = 400, description = "Invalid request or email already in use", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not update this user", body = ErrorResponse),
        (status = 404, description = "User or details not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user_details(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<i32>,
    Valid(Json(request)): Valid<Json<UpdateUserDetailsRequest>>,
) -> ApiResult<UserDetailResponse> {
    trace!("Entering update_user_details function for user_id: {}", user_id);
    identity.require_self_or(Operation::UpdateUserDetails, user_id)?;

    let detail = user_service::update_details(&state.db, &identity, user_id, request).await?;
    info!("Details of user {} updated by user {}", user_id, identity.user_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(UserDetailResponse::from(detail), "Details updated successfully")),
    ))
}

/// Delete a user and everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<i32>,
) -> ApiResult<String> {
    trace!("Entering delete_user function for user_id: {}", user_id);
    identity.require(Operation::DeleteUser)?;

    user_service::delete(&state.db, user_id).await?;
    info!("User with ID {} deleted successfully", user_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(format!("User {} deleted", user_id), "User deleted successfully")),
    ))
}

/// Enrollments of one user
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/enrollments",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = ApiResponse<Vec<EnrollmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view these enrollments", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_enrollments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<i32>,
) -> ApiResult<Vec<EnrollmentResponse>> {
    identity.require_self_or(Operation::ViewUserEnrollments, user_id)?;

    let views = enrollments::of_user(&state.db, user_id).await?;
    let response: Vec<EnrollmentResponse> = views.into_iter().map(EnrollmentResponse::from).collect();
    debug!("User {} has {} enrollments", user_id, response.len());
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Enrollments retrieved successfully"))))
}

/// Installments of one user
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/installments",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Installments retrieved successfully", body = ApiResponse<Vec<InstallmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view these installments", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_installments(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(user_id): Path<i32>,
) -> ApiResult<Vec<InstallmentResponse>> {
    identity.require_self_or(Operation::ViewUserInstallments, user_id)?;

    let response: Vec<InstallmentResponse> = installments::of_user(&state.db, user_id)
        .await?
        .into_iter()
        .map(InstallmentResponse::from)
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Installments retrieved successfully"))))
}
