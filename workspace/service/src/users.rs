use common::{CursorPage, CursorQuery, Page, PageRequest, RegisterUserRequest, UpdateUserDetailsRequest};
use model::entities::user_detail::Role;
use model::entities::{
    enrollment, installment, notification, orientation, payment, user, user_detail,
};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::lifecycle;
use crate::listing;
use crate::policy::{Identity, Operation};

/// A login identity together with its personal details, when present.
pub type UserWithDetail = (user::Model, Option<user_detail::Model>);

fn parse_role(value: &str) -> Result<Role> {
    Role::parse(value).ok_or_else(|| {
        ServiceError::Validation(format!(
            "Unknown role '{}', expected Student, Admin or Supervisor",
            value
        ))
    })
}

async fn ensure_orientation(txn: &DatabaseTransaction, orientation_id: Option<i32>) -> Result<()> {
    if let Some(orientation_id) = orientation_id {
        if orientation::Entity::find_by_id(orientation_id)
            .one(txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Orientation", orientation_id));
        }
    }
    Ok(())
}

async fn ensure_email_free(
    txn: &DatabaseTransaction,
    email: &str,
    except_user: Option<i32>,
) -> Result<()> {
    let mut query = user_detail::Entity::find().filter(user_detail::Column::Email.eq(email));
    if let Some(user_id) = except_user {
        query = query.filter(user_detail::Column::UserId.ne(user_id));
    }
    if query.one(txn).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Email '{}' already exists", email)));
    }
    Ok(())
}

/// Creates a user and its detail row in one transaction.
#[instrument(skip(db, request), fields(username = %request.username))]
pub async fn register(
    db: &DatabaseConnection,
    request: RegisterUserRequest,
) -> Result<(user::Model, user_detail::Model)> {
    trace!("Entering register function");
    let role = parse_role(&request.role)?;

    let txn = db.begin().await?;

    if user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        warn!("Username '{}' already exists", request.username);
        return Err(ServiceError::Conflict(format!(
            "Username '{}' already exists",
            request.username
        )));
    }
    ensure_email_free(&txn, &request.email, None).await?;
    ensure_orientation(&txn, request.orientation_id).await?;

    let user = user::ActiveModel {
        username: Set(request.username),
        password: Set(request.password),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let detail = user_detail::ActiveModel {
        user_id: Set(user.id),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        document_id: Set(request.document_id),
        email: Set(request.email),
        role: Set(role),
        school_year: Set(request.school_year),
        orientation_id: Set(request.orientation_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Registered user {} ({}) as {}", user.id, user.username, role.as_str());
    Ok((user, detail))
}

/// Cursor listing of users with their details, searched over username, email and names.
#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, cursor: &CursorQuery) -> Result<CursorPage<UserWithDetail>> {
    trace!("Listing users");
    let columns: Vec<SimpleExpr> = vec![
        listing::column((user::Entity, user::Column::Username)),
        listing::column((user_detail::Entity, user_detail::Column::Email)),
        listing::column((user_detail::Entity, user_detail::Column::FirstName)),
        listing::column((user_detail::Entity, user_detail::Column::LastName)),
    ];

    let query = user::Entity::find().find_also_related(user_detail::Entity);
    let query = listing::search(query, cursor.search.as_deref(), &columns);
    let page = listing::cursor_page(query, user::Column::Id, cursor, db, |(user, _)| user.id).await?;
    Ok(page)
}

/// Offset search over students' details.
#[instrument(skip(db))]
pub async fn search_students(db: &DatabaseConnection, request: &PageRequest) -> Result<Page<user_detail::Model>> {
    trace!("Searching students");
    let columns = vec![
        listing::column((user_detail::Entity, user_detail::Column::LastName)),
        listing::column((user_detail::Entity, user_detail::Column::FirstName)),
        listing::column((user_detail::Entity, user_detail::Column::DocumentId)),
    ];
    let sortable = vec![
        ("id", listing::column((user_detail::Entity, user_detail::Column::UserId))),
        ("last_name", listing::column((user_detail::Entity, user_detail::Column::LastName))),
        ("first_name", listing::column((user_detail::Entity, user_detail::Column::FirstName))),
        ("document_id", listing::column((user_detail::Entity, user_detail::Column::DocumentId))),
    ];
    let default = ("last_name", listing::column((user_detail::Entity, user_detail::Column::LastName)));

    let query = user_detail::Entity::find().filter(user_detail::Column::Role.eq(Role::Student));
    let query = listing::search(query, request.search.as_deref(), &columns);
    let query = listing::sort(query, request.sort.as_ref(), &sortable, Some(default))
        .order_by_asc(user_detail::Column::Id);
    Ok(listing::paginate(query, request, db).await?)
}

#[instrument(skip(db))]
pub async fn get(db: &DatabaseConnection, user_id: i32) -> Result<UserWithDetail> {
    trace!("Fetching user {}", user_id);
    user::Entity::find_by_id(user_id)
        .find_also_related(user_detail::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user_id))
}

/// Details of the most recently registered user.
#[instrument(skip(db))]
pub async fn latest(db: &DatabaseConnection) -> Result<user_detail::Model> {
    let newest = user::Entity::find()
        .order_by_desc(user::Column::Id)
        .find_also_related(user_detail::Entity)
        .one(db)
        .await?;

    match newest {
        Some((_, Some(detail))) => Ok(detail),
        _ => Err(ServiceError::NotFound("No users registered".to_string())),
    }
}

/// Applies the present fields of `changes` to the user's detail row.
///
/// Callers without [`Operation::ChangeRole`] keep the current role.
#[instrument(skip(db, changes))]
pub async fn update_details(
    db: &DatabaseConnection,
    actor: &Identity,
    user_id: i32,
    changes: UpdateUserDetailsRequest,
) -> Result<user_detail::Model> {
    trace!("Entering update_details for user {}", user_id);
    let txn = db.begin().await?;

    let detail = user_detail::Entity::find()
        .filter(user_detail::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} has no details yet", user_id)))?;

    let mut active: user_detail::ActiveModel = detail.into();

    if let Some(first_name) = changes.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = changes.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(document_id) = changes.document_id {
        active.document_id = Set(document_id);
    }
    if let Some(email) = changes.email {
        ensure_email_free(&txn, &email, Some(user_id)).await?;
        active.email = Set(email);
    }
    if let Some(role) = changes.role {
        if actor.can(Operation::ChangeRole) {
            active.role = Set(parse_role(&role)?);
        } else {
            warn!("User {} may not change roles, ignoring role '{}'", actor.user_id, role);
        }
    }
    if let Some(school_year) = changes.school_year {
        active.school_year = Set(Some(school_year));
    }
    if changes.orientation_id.is_some() {
        ensure_orientation(&txn, changes.orientation_id).await?;
        active.orientation_id = Set(changes.orientation_id);
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    info!("Updated details of user {}", user_id);
    Ok(updated)
}

/// Removes a user with its detail, enrollments, installments, payments and notifications.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, user_id: i32) -> Result<()> {
    trace!("Entering delete for user {}", user_id);
    let txn = db.begin().await?;

    let Some(existing) = user::Entity::find_by_id(user_id).one(&txn).await? else {
        warn!("User with ID {} not found for deletion", user_id);
        return Err(ServiceError::not_found("User", user_id));
    };

    let notifications = notification::Entity::delete_many()
        .filter(notification::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let payments = payment::Entity::delete_many()
        .filter(payment::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    payment::Entity::update_many()
        .col_expr(payment::Column::RecordedBy, Expr::value(Option::<i32>::None))
        .filter(payment::Column::RecordedBy.eq(user_id))
        .exec(&txn)
        .await?;
    let installments = installment::Entity::delete_many()
        .filter(installment::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let enrollments = enrollment::Entity::delete_many()
        .filter(enrollment::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    user_detail::Entity::delete_many()
        .filter(user_detail::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    lifecycle::delete::<user::Entity, _>(&txn, existing).await?;

    txn.commit().await?;
    info!(
        "Deleted user {} with {} enrollments, {} installments, {} payments, {} notifications",
        user_id,
        enrollments.rows_affected,
        installments.rows_affected,
        payments.rows_affected,
        notifications.rows_affected
    );
    Ok(())
}
