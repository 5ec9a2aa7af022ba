//! User repository implementation with soft delete support.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use super::entities::{
    role,
    user::{self, ActiveModel, Entity as UserEntity},
    user_role,
};
use common::{AppError, AppResult};
use domain::{NewUser, User, UserChanges, EMAIL_EXISTS_MESSAGE};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Every method ignores soft-deleted records.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find live user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find live user by email address, ignoring case
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Up to `limit` live users starting at row `offset`, newest first, plus
    /// the total live count.
    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)>;

    /// Insert a user. Fails with `Conflict` when a live user holds the email.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    /// Apply changes to a live user. `None` when there is no such user.
    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>>;

    /// Stamp `deleted_at` on a live user. `false` when there is no such user.
    async fn soft_delete(&self, id: i64) -> AppResult<bool>;
}

/// Translate a write failure, turning the live-email index violation into `Conflict`.
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(EMAIL_EXISTS_MESSAGE),
        _ => AppError::from(err),
    }
}

/// Concrete implementation of UserRepository backed by SeaORM
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn with_roles(&self, model: user::Model) -> AppResult<User> {
        let roles = model.find_related(role::Entity).all(&self.db).await?;
        Ok(model.into_user(roles)?)
    }

    async fn find_live(&self, id: i64) -> AppResult<Option<user::Model>> {
        Ok(UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        tracing::debug!(user_id = id, "Looking up user by id");
        match self.find_live(id).await? {
            Some(model) => Ok(Some(self.with_roles(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(email.to_lowercase()),
            )
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        match result {
            Some(model) => Ok(Some(self.with_roles(model).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)> {
        let live = UserEntity::find().filter(user::Column::DeletedAt.is_null());

        let total = live.clone().count(&self.db).await?;
        let models = live
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        let roles = models
            .load_many_to_many(role::Entity, user_role::Entity, &self.db)
            .await?;

        let users = models
            .into_iter()
            .zip(roles)
            .map(|(model, roles)| model.into_user(roles))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            phone: Set(new_user.phone),
            is_active: Set(new_user.status.code()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(write_error)?;
        Ok(model.into_user(Vec::new())?)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>> {
        // Single statement, so a concurrent soft delete cannot be overwritten
        let mut query = UserEntity::update_many()
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null());

        if let Some(email) = changes.email {
            query = query.col_expr(user::Column::Email, Expr::value(email));
        }
        if let Some(password_hash) = changes.password_hash {
            query = query.col_expr(user::Column::PasswordHash, Expr::value(password_hash));
        }
        if let Some(first_name) = changes.first_name {
            query = query.col_expr(user::Column::FirstName, Expr::value(first_name));
        }
        if let Some(last_name) = changes.last_name {
            query = query.col_expr(user::Column::LastName, Expr::value(last_name));
        }
        if let Some(phone) = changes.phone {
            query = query.col_expr(user::Column::Phone, Expr::value(phone));
        }
        if let Some(status) = changes.status {
            query = query.col_expr(user::Column::IsActive, Expr::value(status.code()));
        }

        let updated = query
            .exec_with_returning(&self.db)
            .await
            .map_err(write_error)?
            .into_iter()
            .next();

        match updated {
            Some(model) => Ok(Some(self.with_roles(model).await?)),
            None => Ok(None),
        }
    }

    async fn soft_delete(&self, id: i64) -> AppResult<bool> {
        let now = Utc::now();
        let result = UserEntity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
