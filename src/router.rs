use crate::handlers::{
    enrollments::{create_enrollment, delete_enrollment, list_enrollments, update_enrollment},
    health::health_check,
    installments::{create_installment, get_installment},
    notifications::{generate_reminders, get_my_notifications},
    orientations::{
        create_orientation, delete_orientation, get_orientation, get_orientation_enrollments,
        list_orientations, search_orientations, update_orientation,
    },
    payments::{
        create_payment, delete_payment, get_latest_payment, get_my_payments, list_payments,
        update_payment,
    },
    subjects::{
        create_subject, delete_subject, get_subject, get_subject_enrollments, list_subjects,
        list_subjects_detailed, search_subjects, update_subject,
    },
    users::{
        delete_user, get_latest_user, get_profile, get_user, get_user_enrollments,
        get_user_installments, list_users, register_user, search_students, update_user_details,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // User routes
        .route("/api/v1/users", post(register_user))
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/students/search", post(search_students))
        .route("/api/v1/users/profile", get(get_profile))
        .route("/api/v1/users/latest", get(get_latest_user))
        .route("/api/v1/users/:user_id", get(get_user))
        .route("/api/v1/users/:user_id", delete(delete_user))
        .route("/api/v1/users/:user_id/details", patch(update_user_details))
        .route("/api/v1/users/:user_id/enrollments", get(get_user_enrollments))
        .route("/api/v1/users/:user_id/installments", get(get_user_installments))
        // Orientation routes
        .route("/api/v1/orientations", post(create_orientation))
        .route("/api/v1/orientations", get(list_orientations))
        .route("/api/v1/orientations/search", post(search_orientations))
        .route("/api/v1/orientations/:orientation_id", get(get_orientation))
        .route("/api/v1/orientations/:orientation_id", patch(update_orientation))
        .route("/api/v1/orientations/:orientation_id", delete(delete_orientation))
        .route(
            "/api/v1/orientations/:orientation_id/enrollments",
            get(get_orientation_enrollments),
        )
        // Subject routes
        .route("/api/v1/subjects", post(create_subject))
        .route("/api/v1/subjects", get(list_subjects))
        .route("/api/v1/subjects/detailed", get(list_subjects_detailed))
        .route("/api/v1/subjects/search", post(search_subjects))
        .route("/api/v1/subjects/:subject_id", get(get_subject))
        .route("/api/v1/subjects/:subject_id", put(update_subject))
        .route("/api/v1/subjects/:subject_id", delete(delete_subject))
        .route("/api/v1/subjects/:subject_id/enrollments", get(get_subject_enrollments))
        // Enrollment routes, keyed by (user_id, subject_id)
        .route("/api/v1/enrollments", post(create_enrollment))
        .route("/api/v1/enrollments", get(list_enrollments))
        .route("/api/v1/enrollments", patch(update_enrollment))
        .route("/api/v1/enrollments", delete(delete_enrollment))
        // Billing routes
        .route("/api/v1/installments", post(create_installment))
        .route("/api/v1/installments/:installment_id", get(get_installment))
        .route("/api/v1/payments", post(create_payment))
        .route("/api/v1/payments", get(list_payments))
        .route("/api/v1/payments/latest", get(get_latest_payment))
        .route("/api/v1/payments/mine", get(get_my_payments))
        .route("/api/v1/payments/:payment_id", patch(update_payment))
        .route("/api/v1/payments/:payment_id", delete(delete_payment))
        // Notification routes
        .route("/api/v1/notifications/reminders", post(generate_reminders))
        .route("/api/v1/notifications/mine", get(get_my_notifications))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
