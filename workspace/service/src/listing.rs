//! Search, sort and pagination helpers shared by every listing endpoint.
//!
//! Offset listings compose as filter -> sort -> window:
//!
//! ```ignore
//! let query = listing::search(Orientation::find(), request.search.as_deref(), &search_columns());
//! let query = listing::sort(query, request.sort.as_ref(), &sortable(), Some(default_sort()));
//! let page = listing::paginate(query, &request, db).await?;
//! ```
//!
//! Cursor listings filter on `id > last_seen_id`, order by id and cut after `limit` rows.

use common::{CursorPage, CursorQuery, Page, PageRequest, SortSpec};
use sea_orm::sea_query::{Alias, Expr, Func, IntoColumnRef, Order, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, PaginatorTrait, QueryFilter, QueryOrder,
    SelectorTrait,
};
use tracing::{debug, trace};

/// A table-qualified column usable as a search or sort expression.
pub fn column<C: IntoColumnRef>(column: C) -> SimpleExpr {
    Expr::col(column).into()
}

/// A table-qualified column rendered as text, for searching numeric columns.
pub fn column_as_text<C: IntoColumnRef>(column: C) -> SimpleExpr {
    Expr::col(column).cast_as(Alias::new("TEXT"))
}

/// Keeps rows where any of `columns` contains `term`, ignoring case.
///
/// A missing or blank term leaves the query untouched.
pub fn search<Q: QueryFilter>(query: Q, term: Option<&str>, columns: &[SimpleExpr]) -> Q {
    let Some(term) = term.map(str::trim).filter(|term| !term.is_empty()) else {
        return query;
    };
    if columns.is_empty() {
        return query;
    }

    trace!("Applying search term '{}' over {} columns", term, columns.len());
    // SQLite folds ASCII letters only, so accented text is compared against both folds of the term
    let lowered = format!("%{}%", term.to_lowercase());
    let uppered = format!("%{}%", term.to_uppercase());
    let condition = columns.iter().fold(Condition::any(), |condition, column| {
        condition
            .add(Expr::expr(Func::lower(column.clone())).like(lowered.clone()))
            .add(Expr::expr(Func::upper(column.clone())).like(uppered.clone()))
    });
    query.filter(condition)
}

/// Orders by the requested field when it is whitelisted, otherwise by `default` ascending.
///
/// Unknown fields never error. With neither a match nor a default the query is unchanged.
pub fn sort<Q: QueryOrder>(
    query: Q,
    spec: Option<&SortSpec>,
    allowed: &[(&str, SimpleExpr)],
    default: Option<(&str, SimpleExpr)>,
) -> Q {
    if let Some(spec) = spec {
        if let Some((name, expr)) = allowed.iter().find(|(name, _)| *name == spec.field) {
            let order = if spec.descending() { Order::Desc } else { Order::Asc };
            trace!("Sorting by '{}' {:?}", name, order);
            return query.order_by(expr.clone(), order);
        }
        debug!("Ignoring unknown sort field '{}'", spec.field);
    }

    match default {
        Some((name, expr)) => {
            trace!("Sorting by default field '{}'", name);
            query.order_by(expr, Order::Asc)
        }
        None => query,
    }
}

/// Counts the filtered set and returns the requested window of it.
pub async fn paginate<'db, C, S>(
    query: S,
    request: &PageRequest,
    db: &'db C,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let (page, page_size) = request.normalize();
    let paginator = query.paginate(db, page_size);

    let total = paginator.num_items().await?;
    // OFFSET is a signed 64-bit value; windows past it are empty
    let offset = (page - 1)
        .checked_mul(page_size)
        .filter(|offset| *offset <= i64::MAX as u64);
    let items = match offset {
        Some(_) => paginator.fetch_page(page - 1).await?,
        None => {
            debug!("Page {} of size {} lies beyond any offset", page, page_size);
            Vec::new()
        }
    };
    debug!(
        "Fetched page {} ({} of {} rows, page size {})",
        page,
        items.len(),
        total,
        page_size
    );

    Ok(Page {
        items,
        total,
        page,
        page_size,
    })
}

/// Returns up to `limit` rows with an id above `last_seen_id`, in id order.
pub async fn cursor_page<'db, C, S, K, F>(
    query: S,
    id_column: K,
    cursor: &CursorQuery,
    db: &'db C,
    id_of: F,
) -> Result<CursorPage<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: QueryFilter + QueryOrder + PaginatorTrait<'db, C>,
    K: ColumnTrait,
    F: Fn(&<S::Selector as SelectorTrait>::Item) -> i32,
{
    let (last_seen_id, limit) = cursor.normalize();

    let items = query
        .filter(id_column.gt(last_seen_id))
        .order_by_asc(id_column)
        .paginate(db, limit)
        .fetch_page(0)
        .await?;

    let next_cursor = items.last().map(&id_of);
    debug!(
        "Fetched {} rows after id {}, next cursor {:?}",
        items.len(),
        last_seen_id,
        next_cursor
    );

    Ok(CursorPage { items, next_cursor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use model::entities::orientation::OrientationStatus;
    use model::entities::prelude::*;
    use model::entities::{orientation, subject};
    use sea_orm::EntityTrait;
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    async fn seed_orientations(db: &DatabaseConnection, count: usize) -> Result<(), DbErr> {
        for index in 1..=count {
            orientation::ActiveModel {
                name: Set(format!("Orientation {:02}", index)),
                status: Set(OrientationStatus::Active),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    fn name_columns() -> Vec<SimpleExpr> {
        vec![column((orientation::Entity, orientation::Column::Name))]
    }

    fn sortable() -> Vec<(&'static str, SimpleExpr)> {
        vec![
            ("id", column((orientation::Entity, orientation::Column::Id))),
            ("name", column((orientation::Entity, orientation::Column::Name))),
        ]
    }

    fn page(page: i64) -> PageRequest {
        PageRequest {
            page: Some(page),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_page_size_splits_45_rows() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 45).await?;

        let mut seen = Vec::new();
        for (index, expected) in [20, 20, 5].into_iter().enumerate() {
            let query = sort(Orientation::find(), None, &sortable(), Some(sortable().remove(0)));
            let result = paginate(query, &page(index as i64 + 1), &db).await?;
            assert_eq!(result.items.len(), expected);
            assert_eq!(result.total, 45);
            assert_eq!(result.page_size, 20);
            assert_eq!(result.page, index as u64 + 1);
            seen.extend(result.items.into_iter().map(|o| o.id));
        }

        assert_eq!(seen, (1..=45).collect::<Vec<_>>());

        let beyond = paginate(Orientation::find(), &page(4), &db).await?;
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 45);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_beyond_any_offset_is_empty() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 45).await?;

        let result = paginate(Orientation::find(), &page(i64::MAX), &db).await?;
        assert!(result.items.is_empty());
        assert_eq!(result.total, 45);
        assert_eq!(result.page, i64::MAX as u64);

        let huge = PageRequest {
            page: Some(i64::MAX / 100),
            page_size: Some(200),
            ..Default::default()
        };
        let result = paginate(Orientation::find(), &huge, &db).await?;
        assert!(result.items.is_empty());
        assert_eq!(result.total, 45);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_folds_accented_letters() -> Result<(), DbErr> {
        let db = setup_db().await?;
        for name in ["ÁLGEBRA", "álgebra lineal", "Geometría"] {
            orientation::ActiveModel {
                name: Set(name.to_string()),
                status: Set(OrientationStatus::Active),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        for (term, expected) in [
            ("ÁLGEBRA", 2),
            ("álgebra", 2),
            ("Álgebra", 2),
            ("GEOMETRÍA", 1),
            ("geometría", 1),
        ] {
            let query = search(Orientation::find(), Some(term), &name_columns());
            let result = paginate(query, &PageRequest::default(), &db).await?;
            assert_eq!(result.total, expected, "search for {}", term);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_search_blank_and_non_matching_terms() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 12).await?;

        let blank = search(Orientation::find(), Some("   "), &name_columns());
        let result = paginate(blank, &PageRequest::default(), &db).await?;
        assert_eq!(result.total, 12);

        let unmatched = search(Orientation::find(), Some("zzz"), &name_columns());
        let result = paginate(unmatched, &PageRequest::default(), &db).await?;
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);

        let matched = search(Orientation::find(), Some(" ORIENTATION 1"), &name_columns());
        let result = paginate(matched, &PageRequest::default(), &db).await?;
        // "Orientation 10".."Orientation 12"
        assert_eq!(result.total, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_over_cast_column() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 1).await?;
        for year in [1, 2, 3] {
            subject::ActiveModel {
                name: Set(format!("Math {}", year)),
                orientation_id: Set(1),
                year: Set(year),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let columns = vec![column_as_text((subject::Entity, subject::Column::Year))];
        let query = search(Subject::find(), Some("2"), &columns);
        let result = paginate(query, &PageRequest::default(), &db).await?;
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].year, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_sort_field_falls_back_to_default() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 5).await?;

        let descending = SortSpec {
            field: "name".to_string(),
            direction: Some("DESC".to_string()),
        };
        let query = sort(Orientation::find(), Some(&descending), &sortable(), None);
        let result = paginate(query, &PageRequest::default(), &db).await?;
        assert_eq!(result.items[0].name, "Orientation 05");

        let unknown = SortSpec {
            field: "password".to_string(),
            direction: Some("desc".to_string()),
        };
        let default = Some(("name", column((orientation::Entity, orientation::Column::Name))));
        let query = sort(Orientation::find(), Some(&unknown), &sortable(), default);
        let result = paginate(query, &PageRequest::default(), &db).await?;
        assert_eq!(result.items[0].name, "Orientation 01");
        assert_eq!(result.total, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_cursor_chaining_visits_every_row_once() -> Result<(), DbErr> {
        let db = setup_db().await?;
        seed_orientations(&db, 45).await?;

        let mut cursor = CursorQuery {
            last_seen_id: None,
            limit: Some(20),
            search: None,
        };
        let mut seen = Vec::new();
        loop {
            let batch = cursor_page(
                Orientation::find(),
                orientation::Column::Id,
                &cursor,
                &db,
                |o: &orientation::Model| o.id,
            )
            .await?;
            if batch.items.is_empty() {
                assert_eq!(batch.next_cursor, None);
                break;
            }
            assert!(batch.items.len() <= 20);
            seen.extend(batch.items.iter().map(|o| o.id));
            cursor.last_seen_id = batch.next_cursor;
        }

        assert_eq!(seen, (1..=45).collect::<Vec<_>>());
        Ok(())
    }
}
