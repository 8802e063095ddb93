use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InstallmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl InstallmentStatus {
    /// Derives the status from the running totals of an installment.
    ///
    /// Overpayment is allowed: anything at or above the amount due counts as paid.
    pub fn derive(paid_amount: Decimal, amount_due: Decimal) -> Self {
        if paid_amount >= amount_due {
            InstallmentStatus::Paid
        } else if paid_amount.is_zero() {
            InstallmentStatus::Pending
        } else {
            InstallmentStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Partial => "partial",
            InstallmentStatus::Paid => "paid",
        }
    }
}

/// A billing period's amount due from a student.
///
/// `paid_amount + balance == amount_due` holds after every write.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    /// Free label of the billing period, e.g. "2025-03".
    pub period: String,
    pub due_date: Date,
    pub amount_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: InstallmentStatus,
    /// Set once the due-date reminders were generated.
    pub notified: bool,
}

/// Running totals of an installment after a payment was applied or reverted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciled {
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: InstallmentStatus,
}

impl Model {
    /// Returns the totals resulting from adding `delta` to the paid amount.
    /// A negative delta reverts (part of) a payment.
    pub fn reconcile(&self, delta: Decimal) -> Reconciled {
        let paid_amount = self.paid_amount + delta;
        Reconciled {
            paid_amount,
            balance: self.amount_due - paid_amount,
            status: InstallmentStatus::derive(paid_amount, self.amount_due),
        }
    }
}

impl ActiveModel {
    pub fn apply(&mut self, totals: Reconciled) {
        self.paid_amount = sea_orm::Set(totals.paid_amount);
        self.balance = sea_orm::Set(totals.balance);
        self.status = sea_orm::Set(totals.status);
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
