use common::CreateInstallmentRequest;
use model::entities::installment::{self, InstallmentStatus};
use model::entities::user;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::error::{Result, ServiceError};

/// Bills a student for one period. The installment starts unpaid.
#[instrument(skip(db))]
pub async fn create(db: &DatabaseConnection, request: CreateInstallmentRequest) -> Result<installment::Model> {
    if request.amount_due <= Decimal::ZERO {
        return Err(ServiceError::Validation(
            "Amount due must be greater than zero".to_string(),
        ));
    }

    let txn = db.begin().await?;
    if user::Entity::find_by_id(request.user_id).one(&txn).await?.is_none() {
        return Err(ServiceError::not_found("User", request.user_id));
    }

    let created = installment::ActiveModel {
        user_id: Set(request.user_id),
        period: Set(request.period),
        due_date: Set(request.due_date),
        amount_due: Set(request.amount_due),
        paid_amount: Set(Decimal::ZERO),
        balance: Set(request.amount_due),
        status: Set(InstallmentStatus::Pending),
        notified: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        "Installment {} created for user {} ({} due {})",
        created.id, created.user_id, created.amount_due, created.due_date
    );
    Ok(created)
}

#[instrument(skip(db))]
pub async fn get(db: &DatabaseConnection, installment_id: i32) -> Result<installment::Model> {
    installment::Entity::find_by_id(installment_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Installment", installment_id))
}

/// Installments of one student, by due date.
#[instrument(skip(db))]
pub async fn of_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<installment::Model>> {
    if user::Entity::find_by_id(user_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found("User", user_id));
    }
    let installments = installment::Entity::find()
        .filter(installment::Column::UserId.eq(user_id))
        .order_by_asc(installment::Column::DueDate)
        .order_by_asc(installment::Column::Id)
        .all(db)
        .await?;
    debug!("User {} has {} installments", user_id, installments.len());
    Ok(installments)
}
