use common::{CreateSubjectRequest, Page, PageRequest, UpdateSubjectRequest};
use model::entities::{enrollment, orientation, subject};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::is_unique_violation;
use crate::lifecycle;
use crate::listing;

/// A subject with the orientation it belongs to.
pub type SubjectWithOrientation = (subject::Model, Option<orientation::Model>);

async fn ensure_orientation(txn: &DatabaseTransaction, orientation_id: i32) -> Result<()> {
    match orientation::Entity::find_by_id(orientation_id).one(txn).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found("Orientation", orientation_id)),
    }
}

async fn ensure_unique(
    txn: &DatabaseTransaction,
    name: &str,
    orientation_id: i32,
    year: i32,
    except: Option<i32>,
) -> Result<()> {
    let mut query = subject::Entity::find()
        .filter(subject::Column::Name.eq(name))
        .filter(subject::Column::OrientationId.eq(orientation_id))
        .filter(subject::Column::Year.eq(year));
    if let Some(id) = except {
        query = query.filter(subject::Column::Id.ne(id));
    }
    if query.one(txn).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Subject '{}' already exists for orientation {} in year {}",
            name, orientation_id, year
        )));
    }
    Ok(())
}

fn conflict_on_unique(error: DbErr) -> ServiceError {
    if is_unique_violation(&error) {
        ServiceError::Conflict("Subject already exists for this orientation and year".to_string())
    } else {
        ServiceError::Database(error)
    }
}

#[instrument(skip(db))]
pub async fn create(db: &DatabaseConnection, request: CreateSubjectRequest) -> Result<subject::Model> {
    trace!("Entering create subject");
    let txn = db.begin().await?;
    ensure_orientation(&txn, request.orientation_id).await?;
    ensure_unique(&txn, &request.name, request.orientation_id, request.year, None).await?;

    let created = subject::ActiveModel {
        name: Set(request.name),
        orientation_id: Set(request.orientation_id),
        year: Set(request.year),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(conflict_on_unique)?;

    txn.commit().await?;
    info!("Subject created with ID {}: {}", created.id, created.name);
    Ok(created)
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection) -> Result<Vec<subject::Model>> {
    let subjects = subject::Entity::find()
        .order_by_asc(subject::Column::Id)
        .all(db)
        .await?;
    debug!("Retrieved {} subjects", subjects.len());
    Ok(subjects)
}

#[instrument(skip(db))]
pub async fn list_detailed(db: &DatabaseConnection) -> Result<Vec<SubjectWithOrientation>> {
    let subjects = subject::Entity::find()
        .find_also_related(orientation::Entity)
        .order_by_asc(subject::Column::Id)
        .all(db)
        .await?;
    debug!("Retrieved {} subjects with orientations", subjects.len());
    Ok(subjects)
}

/// Offset search over subject name, orientation name and year.
#[instrument(skip(db))]
pub async fn search(db: &DatabaseConnection, request: &PageRequest) -> Result<Page<SubjectWithOrientation>> {
    trace!("Searching subjects");
    let columns = vec![
        listing::column((subject::Entity, subject::Column::Name)),
        listing::column((orientation::Entity, orientation::Column::Name)),
        listing::column_as_text((subject::Entity, subject::Column::Year)),
    ];
    let sortable = vec![
        ("id", listing::column((subject::Entity, subject::Column::Id))),
        ("name", listing::column((subject::Entity, subject::Column::Name))),
        ("year", listing::column((subject::Entity, subject::Column::Year))),
        ("orientation", listing::column((orientation::Entity, orientation::Column::Name))),
    ];
    let default = ("name", listing::column((subject::Entity, subject::Column::Name)));

    let query = subject::Entity::find().find_also_related(orientation::Entity);
    let query = listing::search(query, request.search.as_deref(), &columns);
    let query = listing::sort(query, request.sort.as_ref(), &sortable, Some(default))
        .order_by_asc(subject::Column::Id);
    Ok(listing::paginate(query, request, db).await?)
}

#[instrument(skip(db))]
pub async fn get_detailed(db: &DatabaseConnection, subject_id: i32) -> Result<SubjectWithOrientation> {
    subject::Entity::find_by_id(subject_id)
        .find_also_related(orientation::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Subject", subject_id))
}

#[instrument(skip(db))]
pub async fn update(
    db: &DatabaseConnection,
    subject_id: i32,
    request: UpdateSubjectRequest,
) -> Result<subject::Model> {
    let txn = db.begin().await?;
    let existing = subject::Entity::find_by_id(subject_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Subject", subject_id))?;

    let name = request.name.unwrap_or_else(|| existing.name.clone());
    let orientation_id = request.orientation_id.unwrap_or(existing.orientation_id);
    let year = request.year.unwrap_or(existing.year);

    if orientation_id != existing.orientation_id {
        ensure_orientation(&txn, orientation_id).await?;
    }
    ensure_unique(&txn, &name, orientation_id, year, Some(subject_id)).await?;

    let mut active: subject::ActiveModel = existing.into();
    active.name = Set(name);
    active.orientation_id = Set(orientation_id);
    active.year = Set(year);

    let updated = active.update(&txn).await.map_err(conflict_on_unique)?;
    txn.commit().await?;
    info!("Subject {} updated", subject_id);
    Ok(updated)
}

/// Removes a subject and every enrollment in it.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, subject_id: i32) -> Result<()> {
    let txn = db.begin().await?;
    let Some(existing) = subject::Entity::find_by_id(subject_id).one(&txn).await? else {
        warn!("Subject with ID {} not found for deletion", subject_id);
        return Err(ServiceError::not_found("Subject", subject_id));
    };

    let enrollments = enrollment::Entity::delete_many()
        .filter(enrollment::Column::SubjectId.eq(subject_id))
        .exec(&txn)
        .await?;
    lifecycle::delete::<subject::Entity, _>(&txn, existing).await?;

    txn.commit().await?;
    info!(
        "Subject {} deleted together with {} enrollments",
        subject_id, enrollments.rows_affected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_subject, insert_user, setup_db};
    use chrono::NaiveDate;
    use model::entities::user_detail::Role;
    use sea_orm::PaginatorTrait;

    fn biology(orientation_id: i32, year: i32) -> CreateSubjectRequest {
        CreateSubjectRequest {
            name: "Biology".to_string(),
            orientation_id,
            year,
        }
    }

    #[tokio::test]
    async fn test_create_checks_orientation_and_uniqueness() -> Result<()> {
        let db = setup_db().await?;
        let existing = insert_subject(&db, "Sciences", "Chemistry").await?;

        let created = create(&db, biology(existing.orientation_id, 3)).await?;
        assert_eq!(created.year, 3);
        create(&db, biology(existing.orientation_id, 4)).await?;

        let duplicate = create(&db, biology(existing.orientation_id, 3)).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

        let orphan = create(&db, biology(999, 3)).await;
        assert!(matches!(orphan, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_collision() -> Result<()> {
        let db = setup_db().await?;
        let chemistry = insert_subject(&db, "Sciences", "Chemistry").await?;
        let physics = create(
            &db,
            CreateSubjectRequest {
                name: "Physics".to_string(),
                orientation_id: chemistry.orientation_id,
                year: 1,
            },
        )
        .await?;

        let rename = UpdateSubjectRequest {
            name: Some("Chemistry".to_string()),
            ..Default::default()
        };
        assert!(matches!(update(&db, physics.id, rename).await, Err(ServiceError::Conflict(_))));

        let move_year = UpdateSubjectRequest {
            year: Some(2),
            ..Default::default()
        };
        let updated = update(&db, physics.id, move_year).await?;
        assert_eq!(updated.year, 2);
        assert_eq!(updated.name, "Physics");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_joins_orientation() -> Result<()> {
        let db = setup_db().await?;
        insert_subject(&db, "Sciences", "Chemistry").await?;
        insert_subject(&db, "Humanities", "History").await?;

        let request = PageRequest {
            search: Some("humani".to_string()),
            ..Default::default()
        };
        let page = search(&db, &request).await?;
        assert_eq!(page.total, 1);
        let (subject, orientation) = &page.items[0];
        assert_eq!(subject.name, "History");
        assert_eq!(orientation.as_ref().map(|o| o.name.as_str()), Some("Humanities"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_enrollments() -> Result<()> {
        let db = setup_db().await?;
        let subject = insert_subject(&db, "Sciences", "Chemistry").await?;
        let student = insert_user(&db, "gus", Role::Student).await?;
        enrollment::ActiveModel {
            user_id: Set(student.id),
            subject_id: Set(subject.id),
            state: Set(enrollment::DEFAULT_STATE.to_string()),
            grade: Set(None),
            enrolled_on: Set(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            year_taken: Set(2025),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        delete(&db, subject.id).await?;
        assert_eq!(enrollment::Entity::find().count(&db).await?, 0);
        assert!(matches!(get_detailed(&db, subject.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
