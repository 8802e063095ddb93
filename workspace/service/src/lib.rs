//! Entity services of the school administration backend.
//!
//! Services take a database handle and validated request bodies and return
//! entity models. Every write spanning more than one row runs inside a single
//! database transaction.

pub mod enrollments;
pub mod error;
pub mod installments;
mod lifecycle;
pub mod listing;
pub mod notifications;
pub mod orientations;
pub mod payments;
pub mod policy;
pub mod subjects;
pub mod users;

pub use error::{Result, ServiceError};
pub use policy::{Identity, Operation};

/// Returns true when a database error reports a violated unique constraint.
pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    matches!(
        error.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use migration::{Migrator, MigratorTrait};
    use model::entities::{orientation, subject, user, user_detail};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};

    /// Create an in-memory SQLite database with all migrations applied
    pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;
        Ok(db)
    }

    pub async fn insert_user(
        db: &DatabaseConnection,
        username: &str,
        role: user_detail::Role,
    ) -> Result<user::Model, DbErr> {
        let user = user::ActiveModel {
            username: Set(username.to_string()),
            password: Set("secret".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        user_detail::ActiveModel {
            user_id: Set(user.id),
            first_name: Set(format!("{}-first", username)),
            last_name: Set(format!("{}-last", username)),
            document_id: Set(format!("DOC-{}", username)),
            email: Set(format!("{}@school.test", username)),
            role: Set(role),
            school_year: Set(None),
            orientation_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(user)
    }

    pub async fn insert_subject(
        db: &DatabaseConnection,
        orientation_name: &str,
        subject_name: &str,
    ) -> Result<subject::Model, DbErr> {
        let orientation = orientation::ActiveModel {
            name: Set(orientation_name.to_string()),
            status: Set(orientation::OrientationStatus::Active),
            ..Default::default()
        }
        .insert(db)
        .await?;

        subject::ActiveModel {
            name: Set(subject_name.to_string()),
            orientation_id: Set(orientation.id),
            year: Set(1),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
