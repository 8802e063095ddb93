//! Per-entity deletion semantics.
//!
//! Each entity with a delete operation declares how it is carried out, so
//! services never decide it route by route.

use sea_orm::{EntityTrait, Set};

use crate::entities::{enrollment, orientation, payment, subject, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// The row is physically removed. Dependent rows go first.
    Hard,
    /// The row stays and is flagged inactive.
    Soft,
}

pub trait Lifecycle: EntityTrait {
    const DELETION: DeletionPolicy;

    /// The row as it is stored after a soft deletion.
    ///
    /// Only soft-deleted entities return a value.
    fn retire(_model: Self::Model) -> Option<Self::ActiveModel> {
        None
    }
}

impl Lifecycle for user::Entity {
    const DELETION: DeletionPolicy = DeletionPolicy::Hard;
}

impl Lifecycle for orientation::Entity {
    const DELETION: DeletionPolicy = DeletionPolicy::Soft;

    fn retire(model: orientation::Model) -> Option<orientation::ActiveModel> {
        let mut active: orientation::ActiveModel = model.into();
        active.status = Set(orientation::OrientationStatus::Inactive);
        Some(active)
    }
}

impl Lifecycle for subject::Entity {
    const DELETION: DeletionPolicy = DeletionPolicy::Hard;
}

impl Lifecycle for enrollment::Entity {
    const DELETION: DeletionPolicy = DeletionPolicy::Hard;
}

impl Lifecycle for payment::Entity {
    const DELETION: DeletionPolicy = DeletionPolicy::Hard;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::ActiveValue;

    #[test]
    fn test_only_orientations_are_soft_deleted() {
        assert_eq!(orientation::Entity::DELETION, DeletionPolicy::Soft);
        assert_eq!(user::Entity::DELETION, DeletionPolicy::Hard);
        assert_eq!(subject::Entity::DELETION, DeletionPolicy::Hard);
        assert_eq!(enrollment::Entity::DELETION, DeletionPolicy::Hard);
        assert_eq!(payment::Entity::DELETION, DeletionPolicy::Hard);
    }

    #[test]
    fn test_retired_orientation_is_inactive() {
        let model = orientation::Model {
            id: 4,
            name: "Humanities".to_string(),
            status: orientation::OrientationStatus::Active,
        };

        let retired = orientation::Entity::retire(model).expect("orientations can be retired");
        assert_eq!(retired.id, ActiveValue::Unchanged(4));
        assert_eq!(retired.status, ActiveValue::Set(orientation::OrientationStatus::Inactive));
    }

    #[test]
    fn test_hard_deleted_rows_have_no_retired_state() {
        let model = enrollment::Model {
            id: 1,
            user_id: 2,
            subject_id: 3,
            state: enrollment::DEFAULT_STATE.to_string(),
            grade: None,
            enrolled_on: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            year_taken: 2025,
        };
        assert!(enrollment::Entity::retire(model).is_none());
    }
}
