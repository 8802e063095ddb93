//! Deletion carried out the way each entity declares it.

use model::lifecycle::{DeletionPolicy, Lifecycle};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityName, IntoActiveModel};
use tracing::debug;

use crate::error::Result;

/// Deletes `model` according to its entity's [`DeletionPolicy`] and returns the row as it last existed.
///
/// Hard deletion removes the row, so callers clear dependent rows first on the same connection.
/// Soft deletion stores the retired row instead.
pub(crate) async fn delete<E, C>(conn: &C, model: E::Model) -> Result<E::Model>
where
    E: Lifecycle,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: Send + 'static,
    C: ConnectionTrait,
{
    let table = E::default().table_name().to_owned();
    match E::DELETION {
        DeletionPolicy::Soft => {
            let retired = E::retire(model).ok_or_else(|| {
                DbErr::Custom(format!("{} is soft-deleted but has no retired state", table))
            })?;
            debug!("Retiring row of {}", table);
            Ok(retired.update(conn).await?)
        }
        DeletionPolicy::Hard => {
            debug!("Removing row of {}", table);
            model.clone().into_active_model().delete(conn).await?;
            Ok(model)
        }
    }
}
