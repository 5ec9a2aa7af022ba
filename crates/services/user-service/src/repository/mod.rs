//! Repository layer for data access.

pub mod entities;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod user_repository;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryUserStore;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserStore};
