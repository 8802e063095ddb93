use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use common::{CreateEnrollmentRequest, EnrollmentPair, Page, PageRequest, UpdateEnrollmentRequest};
use model::entities::{enrollment, subject, user, user_detail};
use sea_orm::sea_query::JoinType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationDef, RelationTrait, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::is_unique_violation;
use crate::lifecycle;
use crate::listing;

/// An enrollment with the student's details and the subject, as shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentView {
    pub enrollment: enrollment::Model,
    pub student: Option<user_detail::Model>,
    pub subject: Option<subject::Model>,
}

/// Joins an enrollment to the details of its student.
fn student_detail_relation() -> RelationDef {
    enrollment::Entity::belongs_to(user_detail::Entity)
        .from(enrollment::Column::UserId)
        .to(user_detail::Column::UserId)
        .into()
}

/// Loads the student details and subjects referenced by `enrollments`.
async fn hydrate<C: ConnectionTrait>(db: &C, enrollments: Vec<enrollment::Model>) -> Result<Vec<EnrollmentView>> {
    let user_ids: HashSet<i32> = enrollments.iter().map(|e| e.user_id).collect();
    let subject_ids: HashSet<i32> = enrollments.iter().map(|e| e.subject_id).collect();

    let details: HashMap<i32, user_detail::Model> = user_detail::Entity::find()
        .filter(user_detail::Column::UserId.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|detail| (detail.user_id, detail))
        .collect();
    let subjects: HashMap<i32, subject::Model> = subject::Entity::find()
        .filter(subject::Column::Id.is_in(subject_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|subject| (subject.id, subject))
        .collect();

    Ok(enrollments
        .into_iter()
        .map(|enrollment| EnrollmentView {
            student: details.get(&enrollment.user_id).cloned(),
            subject: subjects.get(&enrollment.subject_id).cloned(),
            enrollment,
        })
        .collect())
}

/// Enrolls a student in a subject. A pair can be enrolled only once.
#[instrument(skip(db))]
pub async fn enroll(
    db: &DatabaseConnection,
    request: CreateEnrollmentRequest,
    today: NaiveDate,
) -> Result<enrollment::Model> {
    trace!("Entering enroll");
    let txn = db.begin().await?;

    if user::Entity::find_by_id(request.user_id).one(&txn).await?.is_none() {
        return Err(ServiceError::not_found("User", request.user_id));
    }
    if subject::Entity::find_by_id(request.subject_id).one(&txn).await?.is_none() {
        return Err(ServiceError::not_found("Subject", request.subject_id));
    }
    if find_pair(&txn, request.user_id, request.subject_id).await?.is_some() {
        warn!(
            "User {} is already enrolled in subject {}",
            request.user_id, request.subject_id
        );
        return Err(ServiceError::Conflict(format!(
            "User {} is already enrolled in subject {}",
            request.user_id, request.subject_id
        )));
    }

    let enrolled_on = request.enrolled_on.unwrap_or(today);
    let created = enrollment::ActiveModel {
        user_id: Set(request.user_id),
        subject_id: Set(request.subject_id),
        state: Set(request
            .state
            .unwrap_or_else(|| enrollment::DEFAULT_STATE.to_string())),
        grade: Set(request.grade),
        enrolled_on: Set(enrolled_on),
        year_taken: Set(request.year_taken.unwrap_or_else(|| enrolled_on.year())),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|error| {
        if is_unique_violation(&error) {
            ServiceError::Conflict("Enrollment already exists".to_string())
        } else {
            ServiceError::Database(error)
        }
    })?;

    txn.commit().await?;
    info!(
        "Enrolled user {} in subject {} (enrollment {})",
        created.user_id, created.subject_id, created.id
    );
    Ok(created)
}

async fn find_pair<C: ConnectionTrait>(db: &C, user_id: i32, subject_id: i32) -> Result<Option<enrollment::Model>> {
    Ok(enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::SubjectId.eq(subject_id))
        .one(db)
        .await?)
}

fn pair_not_found(user_id: i32, subject_id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "User {} is not enrolled in subject {}",
        user_id, subject_id
    ))
}

/// Updates the enrollment identified by its `(user, subject)` pair.
#[instrument(skip(db))]
pub async fn update(db: &DatabaseConnection, request: UpdateEnrollmentRequest) -> Result<enrollment::Model> {
    let txn = db.begin().await?;
    let existing = find_pair(&txn, request.user_id, request.subject_id)
        .await?
        .ok_or_else(|| pair_not_found(request.user_id, request.subject_id))?;

    let mut active: enrollment::ActiveModel = existing.into();
    if let Some(state) = request.state {
        active.state = Set(state);
    }
    if request.grade.is_some() {
        active.grade = Set(request.grade);
    }
    if let Some(enrolled_on) = request.enrolled_on {
        active.enrolled_on = Set(enrolled_on);
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    info!("Enrollment {} updated", updated.id);
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, pair: EnrollmentPair) -> Result<()> {
    let Some(existing) = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(pair.user_id))
        .filter(enrollment::Column::SubjectId.eq(pair.subject_id))
        .one(db)
        .await?
    else {
        warn!("No enrollment for user {} in subject {}", pair.user_id, pair.subject_id);
        return Err(pair_not_found(pair.user_id, pair.subject_id));
    };

    lifecycle::delete::<enrollment::Entity, _>(db, existing).await?;
    info!("Enrollment of user {} in subject {} deleted", pair.user_id, pair.subject_id);
    Ok(())
}

/// Enrollments of one student, with their subjects.
#[instrument(skip(db))]
pub async fn of_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<EnrollmentView>> {
    if user::Entity::find_by_id(user_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found("User", user_id));
    }
    let enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await?;
    debug!("User {} has {} enrollments", user_id, enrollments.len());
    hydrate(db, enrollments).await
}

/// Roster of a subject.
#[instrument(skip(db))]
pub async fn of_subject(db: &DatabaseConnection, subject_id: i32) -> Result<Vec<EnrollmentView>> {
    if subject::Entity::find_by_id(subject_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found("Subject", subject_id));
    }
    let enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::SubjectId.eq(subject_id))
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await?;
    debug!("Subject {} has {} enrollments", subject_id, enrollments.len());
    hydrate(db, enrollments).await
}

fn search_columns() -> Vec<sea_orm::sea_query::SimpleExpr> {
    vec![
        listing::column((user_detail::Entity, user_detail::Column::FirstName)),
        listing::column((user_detail::Entity, user_detail::Column::LastName)),
        listing::column((subject::Entity, subject::Column::Name)),
        listing::column((enrollment::Entity, enrollment::Column::State)),
    ]
}

fn sortable() -> Vec<(&'static str, sea_orm::sea_query::SimpleExpr)> {
    vec![
        ("id", listing::column((enrollment::Entity, enrollment::Column::Id))),
        ("enrolled_on", listing::column((enrollment::Entity, enrollment::Column::EnrolledOn))),
        ("year_taken", listing::column((enrollment::Entity, enrollment::Column::YearTaken))),
        ("state", listing::column((enrollment::Entity, enrollment::Column::State))),
        ("grade", listing::column((enrollment::Entity, enrollment::Column::Grade))),
        ("last_name", listing::column((user_detail::Entity, user_detail::Column::LastName))),
        ("subject", listing::column((subject::Entity, subject::Column::Name))),
    ]
}

async fn search_filtered(
    db: &DatabaseConnection,
    request: &PageRequest,
    orientation_id: Option<i32>,
) -> Result<Page<EnrollmentView>> {
    trace!("Searching enrollments");
    let mut query = enrollment::Entity::find()
        .join(JoinType::LeftJoin, enrollment::Relation::Subject.def())
        .join(JoinType::LeftJoin, student_detail_relation());
    if let Some(orientation_id) = orientation_id {
        query = query.filter(subject::Column::OrientationId.eq(orientation_id));
    }

    let query = listing::search(query, request.search.as_deref(), &search_columns());
    let default = ("id", listing::column((enrollment::Entity, enrollment::Column::Id)));
    let query = listing::sort(query, request.sort.as_ref(), &sortable(), Some(default))
        .order_by_asc(enrollment::Column::Id);

    let page = listing::paginate(query, request, db).await?;
    let items = hydrate(db, page.items).await?;
    Ok(Page {
        items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    })
}

/// All enrollments, searched over student names, subject name and state.
#[instrument(skip(db))]
pub async fn search(db: &DatabaseConnection, request: &PageRequest) -> Result<Page<EnrollmentView>> {
    search_filtered(db, request, None).await
}

/// Enrollments in subjects of one orientation.
#[instrument(skip(db))]
pub async fn of_orientation(
    db: &DatabaseConnection,
    orientation_id: i32,
    request: &PageRequest,
) -> Result<Page<EnrollmentView>> {
    crate::orientations::get(db, orientation_id).await?;
    search_filtered(db, request, Some(orientation_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_subject, insert_user, setup_db};
    use common::SortSpec;
    use model::entities::user_detail::Role;
    use sea_orm::PaginatorTrait;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn request(user_id: i32, subject_id: i32) -> CreateEnrollmentRequest {
        CreateEnrollmentRequest {
            user_id,
            subject_id,
            state: None,
            grade: None,
            enrolled_on: None,
            year_taken: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_is_a_conflict() -> Result<()> {
        let db = setup_db().await?;
        let student = insert_user(&db, "ines", Role::Student).await?;
        let subject = insert_subject(&db, "Sciences", "Biology").await?;

        let created = enroll(&db, request(student.id, subject.id), today()).await?;
        assert_eq!(created.state, "in-progress");
        assert_eq!(created.enrolled_on, today());
        assert_eq!(created.year_taken, 2025);

        let again = enroll(&db, request(student.id, subject.id), today()).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));

        let count = enrollment::Entity::find()
            .filter(enrollment::Column::UserId.eq(student.id))
            .filter(enrollment::Column::SubjectId.eq(subject.id))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_enroll_requires_existing_rows() -> Result<()> {
        let db = setup_db().await?;
        let student = insert_user(&db, "juan", Role::Student).await?;
        let subject = insert_subject(&db, "Sciences", "Biology").await?;

        assert!(matches!(
            enroll(&db, request(999, subject.id), today()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            enroll(&db, request(student.id, 999), today()).await,
            Err(ServiceError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_by_pair() -> Result<()> {
        let db = setup_db().await?;
        let student = insert_user(&db, "kai", Role::Student).await?;
        let subject = insert_subject(&db, "Sciences", "Biology").await?;
        enroll(&db, request(student.id, subject.id), today()).await?;

        let updated = update(
            &db,
            UpdateEnrollmentRequest {
                user_id: student.id,
                subject_id: subject.id,
                state: Some("approved".to_string()),
                grade: Some(9),
                enrolled_on: None,
            },
        )
        .await?;
        assert_eq!(updated.state, "approved");
        assert_eq!(updated.grade, Some(9));

        let pair = EnrollmentPair {
            user_id: student.id,
            subject_id: subject.id,
        };
        delete(&db, pair).await?;
        assert!(matches!(delete(&db, pair).await, Err(ServiceError::NotFound(_))));

        let missing = update(
            &db,
            UpdateEnrollmentRequest {
                user_id: student.id,
                subject_id: subject.id,
                state: None,
                grade: None,
                enrolled_on: None,
            },
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_views_are_hydrated() -> Result<()> {
        let db = setup_db().await?;
        let lara = insert_user(&db, "lara", Role::Student).await?;
        let mia = insert_user(&db, "mia", Role::Student).await?;
        let biology = insert_subject(&db, "Sciences", "Biology").await?;
        let history = insert_subject(&db, "Humanities", "History").await?;

        enroll(&db, request(lara.id, biology.id), today()).await?;
        enroll(&db, request(lara.id, history.id), today()).await?;
        enroll(&db, request(mia.id, history.id), today()).await?;

        let of_lara = of_user(&db, lara.id).await?;
        assert_eq!(of_lara.len(), 2);
        assert_eq!(of_lara[0].subject.as_ref().map(|s| s.name.as_str()), Some("Biology"));

        let roster = of_subject(&db, history.id).await?;
        let names: Vec<_> = roster
            .iter()
            .filter_map(|view| view.student.as_ref().map(|s| s.first_name.as_str()))
            .collect();
        assert_eq!(names, vec!["lara-first", "mia-first"]);

        let searched = search(
            &db,
            &PageRequest {
                search: Some("MIA".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(searched.total, 1);

        let sorted = search(
            &db,
            &PageRequest {
                sort: Some(SortSpec {
                    field: "subject".to_string(),
                    direction: Some("desc".to_string()),
                }),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(sorted.total, 3);
        assert_eq!(
            sorted.items[0].subject.as_ref().map(|s| s.name.as_str()),
            Some("History")
        );

        let humanities = of_orientation(&db, history.orientation_id, &PageRequest::default()).await?;
        assert_eq!(humanities.total, 2);
        assert!(humanities
            .items
            .iter()
            .all(|view| view.enrollment.subject_id == history.id));
        Ok(())
    }
}
