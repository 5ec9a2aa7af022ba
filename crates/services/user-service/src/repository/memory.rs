//! In-memory `UserRepository` for tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use common::{AppError, AppResult};
use domain::{Lifecycle, NewUser, Password, User, UserChanges, EMAIL_EXISTS_MESSAGE};

use super::UserRepository;

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

/// Emails compare case-insensitively, like the `lower(email)` index.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| !u.is_deleted() && same_email(&u.email, email) && Some(u.id) != except)
    }

    fn live(&mut self, id: i64) -> Option<&mut User> {
        self.rows.get_mut(&id).filter(|u| !u.is_deleted())
    }
}

/// Keeps users in a map behind one lock, so the live-email check and the
/// insert happen atomically like the database's partial unique index.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, deleted ones included.
    pub fn all_rows(&self) -> Vec<User> {
        self.lock().rows.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.lock().live(id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .rows
            .values()
            .find(|u| !u.is_deleted() && same_email(&u.email, email))
            .cloned())
    }

    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)> {
        let inner = self.lock();
        let mut live: Vec<&User> = inner.rows.values().filter(|u| !u.is_deleted()).collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = live.len() as u64;
        let items = live
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut inner = self.lock();
        if inner.email_taken(&new_user.email, None) {
            return Err(AppError::conflict(EMAIL_EXISTS_MESSAGE));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            email: new_user.email,
            password: Password::from_hash(new_user.password_hash),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            status: new_user.status,
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
            roles: Vec::new(),
        };
        inner.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>> {
        let mut inner = self.lock();
        if let Some(email) = &changes.email {
            if inner.live(id).is_some() && inner.email_taken(email, Some(id)) {
                return Err(AppError::conflict(EMAIL_EXISTS_MESSAGE));
            }
        }

        let Some(user) = inner.live(id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password = Password::from_hash(password_hash);
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.lock();
        match inner.live(id) {
            Some(user) => {
                let now = Utc::now();
                user.lifecycle = Lifecycle::Deleted { at: now };
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserStatus;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            status: UserStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_update_never_touches_deleted_row() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("jane@example.com")).await.unwrap();
        assert!(store.soft_delete(user.id).await.unwrap());

        let changes = UserChanges {
            first_name: Some(Some("Ghost".to_string())),
            ..Default::default()
        };
        let result = store.update(user.id, changes).await.unwrap();

        assert!(result.is_none());
        let rows = store.all_rows();
        assert_eq!(rows[0].first_name, None);
    }

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("Jane@Example.com")).await.unwrap();

        let found = store.find_by_email("jane@example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let duplicate = store.create(new_user("JANE@EXAMPLE.COM")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_honours_offset_past_end() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();

        let (items, total) = store.list(u64::MAX, 100).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(total, 1);
    }
}
