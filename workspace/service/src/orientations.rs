use common::{CreateOrientationRequest, Page, PageRequest, UpdateOrientationRequest};
use model::entities::orientation::{self, OrientationStatus};
use model::lifecycle::Lifecycle;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{Result, ServiceError};
use crate::lifecycle;
use crate::listing;

fn parse_status(value: &str) -> Result<OrientationStatus> {
    match value.to_lowercase().as_str() {
        "active" => Ok(OrientationStatus::Active),
        "inactive" => Ok(OrientationStatus::Inactive),
        _ => Err(ServiceError::Validation(format!(
            "Unknown orientation status '{}', expected active or inactive",
            value
        ))),
    }
}

async fn ensure_name_free(txn: &DatabaseTransaction, name: &str, except: Option<i32>) -> Result<()> {
    let mut query = orientation::Entity::find().filter(orientation::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(orientation::Column::Id.ne(id));
    }
    if query.one(txn).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Orientation '{}' already exists", name)));
    }
    Ok(())
}

#[instrument(skip(db))]
pub async fn create(db: &DatabaseConnection, request: CreateOrientationRequest) -> Result<orientation::Model> {
    let txn = db.begin().await?;
    ensure_name_free(&txn, &request.name, None).await?;

    let created = orientation::ActiveModel {
        name: Set(request.name),
        status: Set(OrientationStatus::Active),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Orientation created with ID {}: {}", created.id, created.name);
    Ok(created)
}

/// Orientations still offered, by name.
#[instrument(skip(db))]
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<orientation::Model>> {
    let orientations = orientation::Entity::find()
        .filter(orientation::Column::Status.eq(OrientationStatus::Active))
        .order_by_asc(orientation::Column::Name)
        .all(db)
        .await?;
    debug!("Retrieved {} active orientations", orientations.len());
    Ok(orientations)
}

#[instrument(skip(db))]
pub async fn search(db: &DatabaseConnection, request: &PageRequest) -> Result<Page<orientation::Model>> {
    trace!("Searching orientations");
    let columns = vec![listing::column((orientation::Entity, orientation::Column::Name))];
    let sortable = vec![
        ("id", listing::column((orientation::Entity, orientation::Column::Id))),
        ("name", listing::column((orientation::Entity, orientation::Column::Name))),
        ("status", listing::column((orientation::Entity, orientation::Column::Status))),
    ];
    let default = ("name", listing::column((orientation::Entity, orientation::Column::Name)));

    let query = listing::search(orientation::Entity::find(), request.search.as_deref(), &columns);
    let query = listing::sort(query, request.sort.as_ref(), &sortable, Some(default))
        .order_by_asc(orientation::Column::Id);
    Ok(listing::paginate(query, request, db).await?)
}

#[instrument(skip(db))]
pub async fn get(db: &DatabaseConnection, orientation_id: i32) -> Result<orientation::Model> {
    orientation::Entity::find_by_id(orientation_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Orientation", orientation_id))
}

#[instrument(skip(db))]
pub async fn update(
    db: &DatabaseConnection,
    orientation_id: i32,
    request: UpdateOrientationRequest,
) -> Result<orientation::Model> {
    trace!("Entering update for orientation {}", orientation_id);
    let status = request.status.as_deref().map(parse_status).transpose()?;

    let txn = db.begin().await?;
    let existing = orientation::Entity::find_by_id(orientation_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Orientation", orientation_id))?;

    let mut active: orientation::ActiveModel = existing.into();
    if let Some(name) = request.name {
        ensure_name_free(&txn, &name, Some(orientation_id)).await?;
        active.name = Set(name);
    }
    if let Some(status) = status {
        active.status = Set(status);
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    info!("Orientation {} updated", orientation_id);
    Ok(updated)
}

/// Deletes an orientation according to its lifecycle: soft deletion marks it inactive.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, orientation_id: i32) -> Result<orientation::Model> {
    let existing = orientation::Entity::find_by_id(orientation_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Orientation", orientation_id))?;

    let result = lifecycle::delete::<orientation::Entity, _>(db, existing).await?;
    info!("Orientation {} deleted ({:?})", orientation_id, orientation::Entity::DELETION);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use common::SortSpec;

    fn named(name: &str) -> CreateOrientationRequest {
        CreateOrientationRequest {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() -> Result<()> {
        let db = setup_db().await?;
        let created = create(&db, named("Humanities")).await?;
        assert_eq!(created.status, OrientationStatus::Active);

        let duplicate = create(&db, named("Humanities")).await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_soft() -> Result<()> {
        let db = setup_db().await?;
        let kept = create(&db, named("Economics")).await?;
        let dropped = create(&db, named("Arts")).await?;

        let deleted = delete(&db, dropped.id).await?;
        assert_eq!(deleted.status, OrientationStatus::Inactive);
        assert_eq!(get(&db, dropped.id).await?.status, OrientationStatus::Inactive);

        let active = list_active(&db).await?;
        assert_eq!(active, vec![kept]);

        assert!(matches!(delete(&db, 4242).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_name_and_status() -> Result<()> {
        let db = setup_db().await?;
        let first = create(&db, named("Sciences")).await?;
        create(&db, named("Languages")).await?;

        let request = UpdateOrientationRequest {
            name: Some("Natural Sciences".to_string()),
            status: Some("Inactive".to_string()),
        };
        let updated = update(&db, first.id, request).await?;
        assert_eq!(updated.name, "Natural Sciences");
        assert_eq!(updated.status, OrientationStatus::Inactive);

        let clash = UpdateOrientationRequest {
            name: Some("Languages".to_string()),
            status: None,
        };
        assert!(matches!(update(&db, first.id, clash).await, Err(ServiceError::Conflict(_))));

        let bad_status = UpdateOrientationRequest {
            name: None,
            status: Some("archived".to_string()),
        };
        assert!(matches!(update(&db, first.id, bad_status).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_sorts_descending() -> Result<()> {
        let db = setup_db().await?;
        for name in ["Arts", "Economics", "Sciences"] {
            create(&db, named(name)).await?;
        }

        let request = PageRequest {
            sort: Some(SortSpec {
                field: "name".to_string(),
                direction: Some("desc".to_string()),
            }),
            ..Default::default()
        };
        let page = search(&db, &request).await?;
        let names: Vec<_> = page.items.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Sciences", "Economics", "Arts"]);
        Ok(())
    }
}
