use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for billing a student for one period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateInstallmentRequest {
    pub user_id: i32,
    /// Free label of the billing period, e.g. `2025-03`
    #[validate(length(min = 1, max = 20))]
    pub period: String,
    pub due_date: NaiveDate,
    #[schema(value_type = String, example = "1000.00")]
    pub amount_due: Decimal,
}

/// Request body for registering a payment against an installment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreatePaymentRequest {
    pub user_id: i32,
    pub installment_id: i32,
    /// Must be greater than zero
    #[schema(value_type = String, example = "400.00")]
    pub amount: Decimal,
    /// `cash`, `transfer` or `mercado_pago`
    pub method: String,
    #[validate(length(max = 200))]
    pub receipt: Option<String>,
    /// Defaults to now
    pub paid_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UpdatePaymentRequest {
    #[schema(value_type = Option<String>, example = "500.00")]
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    #[validate(length(max = 200))]
    pub receipt: Option<String>,
}

/// Optional filters of the payment cursor listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilter {
    pub user_id: Option<i32>,
    /// Inclusive lower bound on the payment date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the payment date
    pub date_to: Option<NaiveDate>,
    /// Matched against the amount, method and receipt
    pub search: Option<String>,
    pub last_seen_id: Option<i32>,
    pub limit: Option<i64>,
}

impl PaymentFilter {
    pub fn cursor(&self) -> crate::CursorQuery {
        crate::CursorQuery {
            last_seen_id: self.last_seen_id,
            limit: self.limit,
            search: self.search.clone(),
        }
    }
}
