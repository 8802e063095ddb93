//! Common transport-layer types shared between the HTTP layer and the services.
//! Request bodies carry their own validation rules; listing envelopes are the
//! shapes every paginated endpoint answers with.

mod academics;
mod billing;
mod listing;
mod users;

pub use academics::{
    CreateEnrollmentRequest, CreateOrientationRequest, CreateSubjectRequest, EnrollmentPair,
    UpdateEnrollmentRequest, UpdateOrientationRequest, UpdateSubjectRequest,
};
pub use billing::{
    CreateInstallmentRequest, CreatePaymentRequest, PaymentFilter, UpdatePaymentRequest,
};
pub use listing::{
    CursorPage, CursorQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageQuery, PageRequest, SortSpec,
};
pub use users::{RegisterUserRequest, UpdateUserDetailsRequest};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by every successful endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}
