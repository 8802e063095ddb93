use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::auth::TokenVerifier;
use crate::config::Settings;
use crate::handlers::{
    enrollments::EnrollmentResponse,
    installments::InstallmentResponse,
    notifications::NotificationResponse,
    orientations::OrientationResponse,
    payments::{LatestPaymentResponse, PaymentResponse, SettlementResponse},
    subjects::{SubjectDetailResponse, SubjectResponse},
    users::{LatestUserResponse, UserDetailResponse, UserResponse},
};

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Verifies bearer tokens
    pub verifier: Arc<dyn TokenVerifier>,
    pub settings: Arc<Settings>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub detail: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::register_user,
        crate::handlers::users::list_users,
        crate::handlers::users::search_students,
        crate::handlers::users::get_profile,
        crate::handlers::users::get_latest_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user_details,
        crate::handlers::users::delete_user,
        crate::handlers::users::get_user_enrollments,
        crate::handlers::users::get_user_installments,
        crate::handlers::orientations::create_orientation,
        crate::handlers::orientations::list_orientations,
        crate::handlers::orientations::search_orientations,
        crate::handlers::orientations::get_orientation,
        crate::handlers::orientations::update_orientation,
        crate::handlers::orientations::delete_orientation,
        crate::handlers::orientations::get_orientation_enrollments,
        crate::handlers::subjects::create_subject,
        crate::handlers::subjects::list_subjects,
        crate::handlers::subjects::list_subjects_detailed,
        crate::handlers::subjects::search_subjects,
        crate::handlers::subjects::get_subject,
        crate::handlers::subjects::get_subject_enrollments,
        crate::handlers::subjects::update_subject,
        crate::handlers::subjects::delete_subject,
        crate::handlers::enrollments::create_enrollment,
        crate::handlers::enrollments::list_enrollments,
        crate::handlers::enrollments::update_enrollment,
        crate::handlers::enrollments::delete_enrollment,
        crate::handlers::installments::create_installment,
        crate::handlers::installments::get_installment,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_latest_payment,
        crate::handlers::payments::get_my_payments,
        crate::handlers::payments::update_payment,
        crate::handlers::payments::delete_payment,
        crate::handlers::notifications::generate_reminders,
        crate::handlers::notifications::get_my_notifications,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            UserResponse,
            UserDetailResponse,
            LatestUserResponse,
            OrientationResponse,
            SubjectResponse,
            SubjectDetailResponse,
            EnrollmentResponse,
            InstallmentResponse,
            PaymentResponse,
            SettlementResponse,
            LatestPaymentResponse,
            NotificationResponse,
            common::RegisterUserRequest,
            common::UpdateUserDetailsRequest,
            common::CreateOrientationRequest,
            common::UpdateOrientationRequest,
            common::CreateSubjectRequest,
            common::UpdateSubjectRequest,
            common::CreateEnrollmentRequest,
            common::UpdateEnrollmentRequest,
            common::CreateInstallmentRequest,
            common::CreatePaymentRequest,
            common::UpdatePaymentRequest,
            common::PageRequest,
            common::SortSpec,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Users and their personal details"),
        (name = "orientations", description = "Orientation tracks"),
        (name = "subjects", description = "Subject catalogue"),
        (name = "enrollments", description = "Student enrollments in subjects"),
        (name = "installments", description = "Billing installments"),
        (name = "payments", description = "Payments and installment reconciliation"),
        (name = "notifications", description = "Due-date reminders"),
    ),
    info(
        title = "Campus API",
        description = "School administration backend: users, enrollments, orientations, installments and payments",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
