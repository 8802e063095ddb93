//! Payments and the installment totals they move.
//!
//! Creating, editing or deleting a payment adjusts the installment's
//! `paid_amount`, `balance` and `status` in the same transaction, so
//! `paid_amount` always equals the sum of the installment's live payments.

use chrono::NaiveDateTime;
use common::{CreatePaymentRequest, CursorPage, PaymentFilter, UpdatePaymentRequest};
use model::entities::payment::{self, PaymentMethod};
use model::entities::{installment, user_detail};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::lifecycle;
use crate::listing;

/// The payment that was written together with the installment it settled.
pub type Settlement = (payment::Model, installment::Model);

fn parse_method(value: &str) -> Result<PaymentMethod> {
    PaymentMethod::parse(value).ok_or_else(|| {
        ServiceError::Validation(format!(
            "Unknown payment method '{}', expected cash, transfer or mercado_pago",
            value
        ))
    })
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::Validation(
            "Payment amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Adds `delta` to the installment's paid amount and stores the derived totals.
async fn reconcile(
    txn: &DatabaseTransaction,
    installment: installment::Model,
    delta: Decimal,
) -> Result<installment::Model> {
    let totals = installment.reconcile(delta);
    debug!(
        "Installment {}: paid {} -> {}, status {}",
        installment.id,
        installment.paid_amount,
        totals.paid_amount,
        totals.status.as_str()
    );

    let mut active: installment::ActiveModel = installment.into();
    active.apply(totals);
    Ok(active.update(txn).await?)
}

async fn find_installment(txn: &DatabaseTransaction, installment_id: i32) -> Result<installment::Model> {
    installment::Entity::find_by_id(installment_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Installment", installment_id))
}

async fn find_payment(txn: &DatabaseTransaction, payment_id: i32) -> Result<payment::Model> {
    payment::Entity::find_by_id(payment_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payment", payment_id))
}

/// Registers a payment and applies it to its installment.
#[instrument(skip(db, request), fields(installment_id = request.installment_id))]
pub async fn create(
    db: &DatabaseConnection,
    request: CreatePaymentRequest,
    recorded_by: Option<i32>,
    now: NaiveDateTime,
) -> Result<Settlement> {
    trace!("Entering create payment");
    ensure_positive(request.amount)?;
    let method = parse_method(&request.method)?;

    let txn = db.begin().await?;
    let installment = find_installment(&txn, request.installment_id).await?;
    if installment.user_id != request.user_id {
        warn!(
            "Installment {} belongs to user {}, not {}",
            installment.id, installment.user_id, request.user_id
        );
        return Err(ServiceError::Validation(format!(
            "Installment {} does not belong to user {}",
            installment.id, request.user_id
        )));
    }

    let created = payment::ActiveModel {
        user_id: Set(request.user_id),
        installment_id: Set(request.installment_id),
        paid_at: Set(request.paid_at.unwrap_or(now)),
        amount: Set(request.amount),
        method: Set(method),
        receipt: Set(request.receipt),
        recorded_by: Set(recorded_by),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let installment = reconcile(&txn, installment, created.amount).await?;

    txn.commit().await?;
    info!(
        "Payment {} of {} applied to installment {} (now {})",
        created.id,
        created.amount,
        installment.id,
        installment.status.as_str()
    );
    Ok((created, installment))
}

/// Edits a payment. A changed amount moves the installment by the difference.
#[instrument(skip(db, request))]
pub async fn update(db: &DatabaseConnection, payment_id: i32, request: UpdatePaymentRequest) -> Result<Settlement> {
    if let Some(amount) = request.amount {
        ensure_positive(amount)?;
    }
    let method = request.method.as_deref().map(parse_method).transpose()?;

    let txn = db.begin().await?;
    let existing = find_payment(&txn, payment_id).await?;
    let installment = find_installment(&txn, existing.installment_id).await?;
    let delta = request
        .amount
        .map(|amount| amount - existing.amount)
        .unwrap_or(Decimal::ZERO);

    let mut active: payment::ActiveModel = existing.into();
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(method) = method {
        active.method = Set(method);
    }
    if request.receipt.is_some() {
        active.receipt = Set(request.receipt);
    }
    let updated = active.update(&txn).await?;

    let installment = if delta.is_zero() {
        installment
    } else {
        reconcile(&txn, installment, delta).await?
    };

    txn.commit().await?;
    info!("Payment {} updated (amount delta {})", payment_id, delta);
    Ok((updated, installment))
}

/// Deletes a payment and reverts it from its installment.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, payment_id: i32) -> Result<installment::Model> {
    let txn = db.begin().await?;
    let existing = find_payment(&txn, payment_id).await?;
    let installment = find_installment(&txn, existing.installment_id).await?;

    let removed = lifecycle::delete::<payment::Entity, _>(&txn, existing).await?;
    let installment = reconcile(&txn, installment, -removed.amount).await?;

    txn.commit().await?;
    info!(
        "Payment {} deleted, installment {} is {}",
        payment_id,
        installment.id,
        installment.status.as_str()
    );
    Ok(installment)
}

/// Cursor listing of payments with optional student and date range filters.
#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, filter: &PaymentFilter) -> Result<CursorPage<payment::Model>> {
    trace!("Listing payments");
    let mut query = payment::Entity::find();
    if let Some(user_id) = filter.user_id {
        query = query.filter(payment::Column::UserId.eq(user_id));
    }
    if let Some(start) = filter.date_from.and_then(|date| date.and_hms_opt(0, 0, 0)) {
        query = query.filter(payment::Column::PaidAt.gte(start));
    }
    // date_to is inclusive: keep everything before the following midnight
    let end = filter
        .date_to
        .and_then(|date| date.succ_opt())
        .and_then(|date| date.and_hms_opt(0, 0, 0));
    if let Some(end) = end {
        query = query.filter(payment::Column::PaidAt.lt(end));
    }

    let columns = vec![
        listing::column_as_text((payment::Entity, payment::Column::Amount)),
        listing::column((payment::Entity, payment::Column::Method)),
        listing::column((payment::Entity, payment::Column::Receipt)),
    ];
    let cursor = filter.cursor();
    let query = listing::search(query, cursor.search.as_deref(), &columns);
    Ok(listing::cursor_page(query, payment::Column::Id, &cursor, db, |p: &payment::Model| p.id).await?)
}

/// The most recent payment with the payer's details.
#[instrument(skip(db))]
pub async fn latest(db: &DatabaseConnection) -> Result<(payment::Model, Option<user_detail::Model>)> {
    let newest = payment::Entity::find()
        .order_by_desc(payment::Column::PaidAt)
        .order_by_desc(payment::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("No payments registered".to_string()))?;

    let payer = user_detail::Entity::find()
        .filter(user_detail::Column::UserId.eq(newest.user_id))
        .one(db)
        .await?;
    Ok((newest, payer))
}

/// Payments made by one student, newest first.
#[instrument(skip(db))]
pub async fn of_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<payment::Model>> {
    let payments = payment::Entity::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_desc(payment::Column::PaidAt)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await?;
    debug!("User {} has {} payments", user_id, payments.len());
    Ok(payments)
}
