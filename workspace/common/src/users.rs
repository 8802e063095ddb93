use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for registering a user together with its personal details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct RegisterUserRequest {
    /// Login name (must be unique)
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 30))]
    pub document_id: String,
    /// Contact address (must be unique)
    #[validate(email)]
    pub email: String,
    /// `Student`, `Admin` or `Supervisor`
    pub role: String,
    #[validate(range(min = 1, max = 12))]
    pub school_year: Option<i32>,
    pub orientation_id: Option<i32>,
}

/// Partial update of a user's details. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpdateUserDetailsRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub document_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Only administrators may change the role
    pub role: Option<String>,
    #[validate(range(min = 1, max = 12))]
    pub school_year: Option<i32>,
    pub orientation_id: Option<i32>,
}
