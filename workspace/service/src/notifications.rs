use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{CursorPage, CursorQuery};
use model::entities::notification::{self, KIND_DUE_REMINDER, Recipient};
use model::entities::installment;
use model::entities::user_detail::Role;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, trace};

use crate::error::Result;
use crate::listing;
use crate::policy::Identity;

fn student_message(installment: &installment::Model) -> String {
    format!(
        "Your installment for period {} is due on {}. Amount due: ${:.2}",
        installment.period, installment.due_date, installment.amount_due
    )
}

fn admin_message(installment: &installment::Model) -> String {
    format!(
        "Student #{} has an installment due on {}.",
        installment.user_id, installment.due_date
    )
}

/// Creates a student and an admin reminder for every installment due
/// `days_ahead` days after `today` that was not reminded yet.
///
/// Reminded installments are flagged, so running it twice on the same day is a no-op.
#[instrument(skip(db))]
pub async fn generate_reminders(
    db: &DatabaseConnection,
    today: NaiveDate,
    days_ahead: i64,
    now: NaiveDateTime,
) -> Result<Vec<notification::Model>> {
    let due_date = today + Duration::days(days_ahead);
    debug!("Generating reminders for installments due on {}", due_date);

    let txn = db.begin().await?;
    let upcoming = installment::Entity::find()
        .filter(installment::Column::DueDate.eq(due_date))
        .filter(installment::Column::Notified.eq(false))
        .order_by_asc(installment::Column::Id)
        .all(&txn)
        .await?;

    let mut created = Vec::with_capacity(upcoming.len() * 2);
    for installment in upcoming {
        for (recipient, message) in [
            (Recipient::Student, student_message(&installment)),
            (Recipient::Admin, admin_message(&installment)),
        ] {
            let notification = notification::ActiveModel {
                user_id: Set(installment.user_id),
                installment_id: Set(installment.id),
                kind: Set(KIND_DUE_REMINDER.to_string()),
                recipient: Set(recipient),
                message: Set(message),
                sent_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created.push(notification);
        }

        let mut active: installment::ActiveModel = installment.into();
        active.notified = Set(true);
        active.update(&txn).await?;
    }

    txn.commit().await?;
    info!("Generated {} reminders for {}", created.len(), due_date);
    Ok(created)
}

/// Cursor listing of the notifications addressed to the caller.
///
/// Students see the reminders about their own installments, staff see the admin-facing ones.
#[instrument(skip(db))]
pub async fn list_for(
    db: &DatabaseConnection,
    identity: &Identity,
    cursor: &CursorQuery,
) -> Result<CursorPage<notification::Model>> {
    trace!("Listing notifications");
    let query = match identity.role {
        Role::Student => notification::Entity::find()
            .filter(notification::Column::UserId.eq(identity.user_id))
            .filter(notification::Column::Recipient.eq(Recipient::Student)),
        Role::Admin | Role::Supervisor => {
            notification::Entity::find().filter(notification::Column::Recipient.eq(Recipient::Admin))
        }
    };

    let columns = vec![listing::column((notification::Entity, notification::Column::Message))];
    let query = listing::search(query, cursor.search.as_deref(), &columns);
    Ok(listing::cursor_page(query, notification::Column::Id, cursor, db, |n: &notification::Model| n.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installments;
    use crate::test_support::{insert_user, setup_db};
    use common::CreateInstallmentRequest;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(8, 0, 0).unwrap()
    }

    async fn bill(db: &DatabaseConnection, user_id: i32, due_date: NaiveDate) -> Result<installment::Model> {
        installments::create(
            db,
            CreateInstallmentRequest {
                user_id,
                period: "2025-03".to_string(),
                due_date,
                amount_due: Decimal::new(150050, 2),
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_reminders_are_generated_once() -> Result<()> {
        let db = setup_db().await?;
        let student = insert_user(&db, "vera", Role::Student).await?;
        let due = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let target = bill(&db, student.id, due).await?;
        bill(&db, student.id, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()).await?;

        let created = generate_reminders(&db, today(), 7, now()).await?;
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|n| n.installment_id == target.id));
        assert!(created.iter().all(|n| n.kind == KIND_DUE_REMINDER));
        assert_eq!(
            created[0].message,
            "Your installment for period 2025-03 is due on 2025-03-08. Amount due: $1500.50"
        );
        assert_eq!(created[1].recipient, Recipient::Admin);
        assert_eq!(
            created[1].message,
            format!("Student #{} has an installment due on 2025-03-08.", student.id)
        );
        assert!(installments::get(&db, target.id).await?.notified);

        let again = generate_reminders(&db, today(), 7, now()).await?;
        assert!(again.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_the_caller() -> Result<()> {
        let db = setup_db().await?;
        let due = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let first = insert_user(&db, "walter", Role::Student).await?;
        let second = insert_user(&db, "xime", Role::Student).await?;
        bill(&db, first.id, due).await?;
        bill(&db, second.id, due).await?;
        generate_reminders(&db, today(), 7, now()).await?;

        let own = list_for(&db, &Identity::new(first.id, Role::Student), &CursorQuery::default()).await?;
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.items[0].recipient, Recipient::Student);
        assert_eq!(own.items[0].user_id, first.id);

        let staff = list_for(&db, &Identity::new(99, Role::Admin), &CursorQuery::default()).await?;
        assert_eq!(staff.items.len(), 2);
        assert!(staff.items.iter().all(|n| n.recipient == Recipient::Admin));
        Ok(())
    }
}
