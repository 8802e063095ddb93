use sea_orm::entity::prelude::*;

/// Role tag carried by every user detail and by access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "Student")]
    Student,
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Supervisor")]
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Admin => "Admin",
            Role::Supervisor => "Supervisor",
        }
    }

    /// Parses the role string used in tokens and request bodies.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Student" => Some(Role::Student),
            "Admin" => Some(Role::Admin),
            "Supervisor" => Some(Role::Supervisor),
            _ => None,
        }
    }
}

/// Personal data of a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub document_id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub role: Role,
    /// Academic year the student is currently attending.
    pub school_year: Option<i32>,
    pub orientation_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::orientation::Entity",
        from = "Column::OrientationId",
        to = "super::orientation::Column::Id"
    )]
    Orientation,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::orientation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orientation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
