use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ===================== Orientations =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateOrientationRequest {
    /// Orientation name (must be unique)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpdateOrientationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// `active` or `inactive`
    pub status: Option<String>,
}

// ===================== Subjects =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub orientation_id: i32,
    /// School year the subject is taught in
    #[validate(range(min = 1, max = 12))]
    pub year: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub orientation_id: Option<i32>,
    #[validate(range(min = 1, max = 12))]
    pub year: Option<i32>,
}

// ===================== Enrollments =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateEnrollmentRequest {
    pub user_id: i32,
    pub subject_id: i32,
    /// Free-form state, defaults to `in-progress`
    #[validate(length(min = 1, max = 50))]
    pub state: Option<String>,
    pub grade: Option<i32>,
    /// Defaults to today
    pub enrolled_on: Option<NaiveDate>,
    /// Defaults to the year of `enrolled_on`
    pub year_taken: Option<i32>,
}

/// Update of the enrollment identified by `(user_id, subject_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpdateEnrollmentRequest {
    pub user_id: i32,
    pub subject_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub state: Option<String>,
    pub grade: Option<i32>,
    pub enrolled_on: Option<NaiveDate>,
}

/// Identifies one enrollment by its natural key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, IntoParams, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct EnrollmentPair {
    pub user_id: i32,
    pub subject_id: i32,
}
