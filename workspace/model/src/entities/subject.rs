use sea_orm::entity::prelude::*;

/// A course taught within an orientation for a given school year.
/// `(name, orientation_id, year)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub orientation_id: i32,
    pub year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orientation::Entity",
        from = "Column::OrientationId",
        to = "super::orientation::Column::Id"
    )]
    Orientation,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<super::orientation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orientation.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
