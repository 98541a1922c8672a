//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce ownership, validation and authentication rules above storage.
//!
//! # Invariants
//! - Every failure reaches the caller as a typed `ServiceError`; nothing is
//!   retried or recovered internally.
//! - Services remain storage-agnostic; they only see repository traits.

pub mod error;
pub mod folder_service;
pub mod project_service;
pub mod reminder_service;
pub mod task_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
