//! User service - Handles user-related business logic.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use common::{page_offset, AppError, AppResult, OptionExt, Page};
use domain::{
    CreateUser, NewUser, Password, UpdateUser, User, UserChanges, UserStatus,
    EMAIL_EXISTS_MESSAGE, MAX_PAGE_LIMIT,
};

use crate::repository::UserRepository;

fn not_found(id: i64) -> String {
    format!("User with ID {} not found", id)
}

/// User service trait for dependency injection.
///
/// Every operation ignores soft-deleted users.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user with a fresh password digest, active by default.
    async fn create(&self, input: CreateUser) -> AppResult<User>;

    /// One page of live users, newest first.
    async fn list(&self, page: i64, limit: i64) -> AppResult<Page<User>>;

    async fn get_by_id(&self, id: i64) -> AppResult<User>;

    /// Apply only the fields present in `patch`.
    async fn update(&self, id: i64, patch: UpdateUser) -> AppResult<User>;

    /// Soft delete. The row stays in storage.
    async fn remove(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Early exit for an email held by another live user, ignoring case;
    /// the storage constraint is authoritative.
    async fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> AppResult<()> {
        match self.repo.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(AppError::conflict(EMAIL_EXISTS_MESSAGE))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create(&self, input: CreateUser) -> AppResult<User> {
        self.ensure_email_free(&input.email, None).await?;

        let password = Password::new(&input.password)?;
        let user = self
            .repo
            .create(NewUser {
                email: input.email,
                password_hash: password.into_string(),
                first_name: input.first_name,
                last_name: input.last_name,
                phone: input.phone,
                status: UserStatus::Active,
            })
            .await?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    async fn list(&self, page: i64, limit: i64) -> AppResult<Page<User>> {
        if page < 1 {
            return Err(AppError::invalid_argument("Page must be greater than 0"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::invalid_argument(format!(
                "Limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        // Both bounds checked above, so the casts are lossless
        let (page, limit) = (page as u64, limit as u64);
        let offset = page_offset(page, limit)
            .ok_or_else(|| AppError::invalid_argument("Page is out of range"))?;
        let (items, total) = self.repo.list(offset, limit).await?;

        Ok(Page::new(items, total, page, limit))
    }

    async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or_not_found(not_found(id))
    }

    async fn update(&self, id: i64, patch: UpdateUser) -> AppResult<User> {
        let current = self.get_by_id(id).await?;

        let mut changes = UserChanges::default();
        if let Some(email) = patch.email {
            if email != current.email {
                self.ensure_email_free(&email, Some(id)).await?;
                changes.email = Some(email);
            }
        }
        if let Some(password) = patch.password {
            changes.password_hash = Some(Password::new(&password)?.into_string());
        }
        changes.first_name = patch.first_name;
        changes.last_name = patch.last_name;
        changes.phone = patch.phone;
        changes.status = patch.is_active.map(UserStatus::from);

        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or_not_found(not_found(id))?;

        info!(user_id = id, "User updated");
        Ok(user)
    }

    async fn remove(&self, id: i64) -> AppResult<()> {
        self.get_by_id(id).await?;

        if !self.repo.soft_delete(id).await? {
            return Err(AppError::not_found(not_found(id)));
        }

        info!(user_id = id, "User soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryUserStore, MockUserRepository};
    use chrono::Utc;
    use domain::Lifecycle;

    fn sample_user(id: i64, email: &str) -> User {
        let now = Utc::now();
        User {
            id,
            email: email.to_string(),
            password: Password::from_hash("$argon2id$placeholder"),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            phone: None,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
            roles: vec![],
        }
    }

    fn create_input(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password: "SecurePass123".to_string(),
            first_name: Some("Jane".to_string()),
            last_name: None,
            phone: None,
        }
    }

    fn memory_service() -> UserManager {
        UserManager::new(Arc::new(InMemoryUserStore::new()))
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_activates() {
        let service = memory_service();

        let user = service.create(create_input("jane@example.com")).await.unwrap();

        assert!(user.is_active());
        assert_ne!(user.password.as_str(), "SecurePass123");
        assert!(user.password.verify("SecurePass123"));
    }

    #[tokio::test]
    async fn test_create_duplicate_email_conflicts_without_write() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(sample_user(1, email))));
        repo.expect_create().never();

        let service = UserManager::new(Arc::new(repo));
        let result = service.create(create_input("jane@example.com")).await;

        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == "Email already exists"));
    }

    #[tokio::test]
    async fn test_create_twice_with_same_email() {
        let service = memory_service();

        service.create(create_input("jane@example.com")).await.unwrap();
        let second = service.create(create_input("jane@example.com")).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_arguments() {
        let mut repo = MockUserRepository::new();
        repo.expect_list().never();
        let service = UserManager::new(Arc::new(repo));

        for (page, limit) in [(0, 20), (1, 0), (1, 101), (-1, 20)] {
            let result = service.list(page, limit).await;
            assert!(
                matches!(result, Err(AppError::InvalidArgument(_))),
                "page={} limit={}",
                page,
                limit
            );
        }
    }

    #[tokio::test]
    async fn test_list_page_beyond_offset_range_is_rejected() {
        let mut repo = MockUserRepository::new();
        repo.expect_list().never();
        let service = UserManager::new(Arc::new(repo));

        let result = service.list(i64::MAX, 100).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(msg)) if msg == "Page is out of range"));
    }

    #[tokio::test]
    async fn test_list_passes_row_offset_to_store() {
        let mut repo = MockUserRepository::new();
        repo.expect_list()
            .withf(|offset, limit| *offset == 40 && *limit == 20)
            .times(1)
            .returning(|_, _| Ok((vec![], 41)));
        repo.expect_list()
            .withf(|offset, limit| *offset == (i64::MAX as u64 / 100 - 1) * 100 && *limit == 100)
            .times(1)
            .returning(|_, _| Ok((vec![], 41)));
        let service = UserManager::new(Arc::new(repo));

        let third = service.list(3, 20).await.unwrap();
        let far = service.list(i64::MAX / 100, 100).await.unwrap();

        assert_eq!(third.total, 41);
        assert_eq!(third.total_pages(), 3);
        assert!(far.items.is_empty());
        assert_eq!(far.page, i64::MAX as u64 / 100);
    }

    #[tokio::test]
    async fn test_list_single_user_counts() {
        let service = memory_service();
        service.create(create_input("jane@example.com")).await.unwrap();

        let page = service.list(1, 20).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_paged() {
        let service = memory_service();
        for n in 0..3 {
            service
                .create(create_input(&format!("user{}@example.com", n)))
                .await
                .unwrap();
        }

        let first = service.list(1, 2).await.unwrap();
        let second = service.list(2, 2).await.unwrap();

        assert_eq!(first.total, 3);
        assert_eq!(first.total_pages(), 2);
        assert_eq!(first.items[0].email, "user2@example.com");
        assert_eq!(first.items[1].email, "user1@example.com");
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].email, "user0@example.com");
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let service = memory_service();

        let result = service.get_by_id(42).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "User with ID 42 not found"));
    }

    #[tokio::test]
    async fn test_update_only_touches_present_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, "jane@example.com"))));
        repo.expect_find_by_email().never();
        repo.expect_update()
            .withf(|id, changes| {
                *id == 1
                    && *changes
                        == UserChanges {
                            first_name: Some(Some("X".to_string())),
                            ..Default::default()
                        }
            })
            .returning(|id, _| Ok(Some(sample_user(id, "jane@example.com"))));

        let service = UserManager::new(Arc::new(repo));
        let patch = UpdateUser {
            first_name: Some(Some("X".to_string())),
            ..Default::default()
        };

        assert!(service.update(1, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_first_name_keeps_everything_else() {
        let service = memory_service();
        let before = service.create(create_input("jane@example.com")).await.unwrap();

        let after = service
            .update(
                before.id,
                UpdateUser {
                    first_name: Some(Some("X".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(after.first_name.as_deref(), Some("X"));
        assert_eq!(after.email, before.email);
        assert_eq!(after.last_name, before.last_name);
        assert_eq!(after.phone, before.phone);
        assert_eq!(after.status, before.status);
        assert_eq!(after.password, before.password);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_update_same_email_is_not_a_conflict() {
        let service = memory_service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let patch = UpdateUser {
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };

        assert!(service.update(user.id, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_same_email_different_case_conflicts() {
        let service = memory_service();
        service.create(create_input("jane@example.com")).await.unwrap();

        let result = service.create(create_input("Jane@Example.COM")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_own_email_case_only() {
        let service = memory_service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let patch = UpdateUser {
            email: Some("Jane@Example.com".to_string()),
            ..Default::default()
        };
        let updated = service.update(user.id, patch).await.unwrap();

        assert_eq!(updated.email, "Jane@Example.com");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_in_other_case_conflicts() {
        let service = memory_service();
        service.create(create_input("taken@example.com")).await.unwrap();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let patch = UpdateUser {
            email: Some("TAKEN@example.com".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.update(user.id, patch).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let service = memory_service();
        service.create(create_input("taken@example.com")).await.unwrap();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let patch = UpdateUser {
            email: Some("taken@example.com".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.update(user.id, patch).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_password_and_status() {
        let service = memory_service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUser {
                    password: Some("AnotherPass456".to_string()),
                    is_active: Some(false),
                    last_name: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.password.verify("AnotherPass456"));
        assert!(!updated.password.verify("SecurePass123"));
        assert_eq!(updated.status, UserStatus::Inactive);
        assert_eq!(updated.last_name, None);
    }

    #[tokio::test]
    async fn test_update_racing_a_delete_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_user(id, "jane@example.com"))));
        repo.expect_update().times(1).returning(|_, _| Ok(None));

        let service = UserManager::new(Arc::new(repo));
        let patch = UpdateUser {
            first_name: Some(Some("X".to_string())),
            ..Default::default()
        };

        assert!(matches!(
            service.update(1, patch).await,
            Err(AppError::NotFound(msg)) if msg == "User with ID 1 not found"
        ));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let service = memory_service();

        let result = service.update(9, UpdateUser::default()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_hides_user_but_keeps_row() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = UserManager::new(store.clone());
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        service.remove(user.id).await.unwrap();

        assert!(matches!(
            service.get_by_id(user.id).await,
            Err(AppError::NotFound(_))
        ));
        let page = service.list(1, 20).await.unwrap();
        assert!(page.items.iter().all(|u| u.id != user.id));
        assert_eq!(page.total, 0);

        let rows = store.all_rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_deleted());
    }

    #[tokio::test]
    async fn test_remove_twice_is_not_found() {
        let service = memory_service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        service.remove(user.id).await.unwrap();

        assert!(matches!(
            service.remove(user.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_email_reusable_after_remove() {
        let service = memory_service();
        let first = service.create(create_input("jane@example.com")).await.unwrap();
        service.remove(first.id).await.unwrap();

        let second = service.create(create_input("jane@example.com")).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_single_winner() {
        let service = Arc::new(memory_service());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create(create_input("race@example.com")).await })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let (ok, conflicts) = results.into_iter().map(|r| r.unwrap()).fold(
            (0, 0),
            |(ok, conflicts), result| match result {
                Ok(_) => (ok + 1, conflicts),
                Err(AppError::Conflict(_)) => (ok, conflicts + 1),
                Err(other) => panic!("unexpected error: {:?}", other),
            },
        );

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }
}
