//! User registration and login service.
//!
//! # Responsibility
//! - Validate registration input and persist users with an opaque credential.
//! - Resolve a login to a concrete user or an explicit failure.
//!
//! # Invariants
//! - Plain passwords never reach storage or logs.
//! - A failed login is always `AuthenticationFailed`; there is no fallback
//!   identity.

use crate::model::user::{normalize_email, NewUser, User, UserId};
use crate::model::EntityKind;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};

/// Password hashing capability supplied by the embedding application.
pub trait CredentialHasher {
    /// Produces the stored form of `password`.
    fn hash(&self, password: &str) -> Result<String, String>;
    /// Checks `password` against a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// User service facade.
pub struct UserService<R: UserRepository, H: CredentialHasher> {
    repo: R,
    hasher: H,
}

impl<R: UserRepository, H: CredentialHasher> UserService<R, H> {
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Registers one user. A taken email fails with `Conflict`.
    pub fn create_user(&self, request: &NewUser) -> ServiceResult<User> {
        let request = request.normalized()?;
        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(ServiceError::Credential)?;

        let user = self.repo.create_user(
            request.email.as_str(),
            request.name.as_str(),
            password_hash.as_str(),
        )?;
        info!(
            "event=user_create module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    /// Loads one user.
    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(id)?
            .ok_or(ServiceError::NotFound(EntityKind::User, id))
    }

    /// Verifies credentials and returns the matching user.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let user = match normalize_email(email) {
            Ok(email) => self.repo.find_by_email(&email)?,
            Err(_) => None,
        };

        match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => {
                info!(
                    "event=user_login module=service status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            _ => {
                warn!("event=user_login module=service status=error error_code=authentication_failed");
                Err(ServiceError::AuthenticationFailed)
            }
        }
    }
}
