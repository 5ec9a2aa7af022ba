//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{DomainError, Lifecycle, Password, Role, User, UserStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique among rows where `deleted_at` is NULL (partial index)
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// 1 = active, 0 = inactive
    pub is_active: i16,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = live, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRole,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRole.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role::Relation::Role.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert to the domain entity, attaching the loaded roles.
    pub fn into_user(self, roles: Vec<super::role::Model>) -> Result<User, DomainError> {
        Ok(User {
            id: self.id,
            email: self.email,
            password: Password::from_hash(self.password_hash),
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            status: UserStatus::try_from(self.is_active)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lifecycle: Lifecycle::from_deleted_at(self.deleted_at),
            roles: roles.into_iter().map(Role::from).collect(),
        })
    }
}
