//! Common utilities shared across the services.
//!
//! This crate provides:
//! - Unified error handling and the error envelope
//! - Success envelopes and pagination types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod pagination;
pub mod response;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{page_offset, Page};
pub use response::{Created, Envelope, Meta, NoContent, PageMeta};
