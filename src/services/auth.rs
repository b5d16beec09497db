use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::config::AdminBootstrap;
use crate::models::{NewUser, User};
use crate::store::Store;
use crate::utils::error::AppError;
use crate::utils::password::CredentialHasher;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 40))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Result of a credential check.
///
/// There is deliberately one rejection for both an unknown email and a wrong
/// password.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(User),
    Rejected,
}

impl AuthOutcome {
    pub fn into_user(self) -> Option<User> {
        match self {
            AuthOutcome::Authenticated(user) => Some(user),
            AuthOutcome::Rejected => None,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: CredentialHasher,
    /// The admin role doubles as a username; signup may not claim it.
    reserved_username: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: CredentialHasher,
        reserved_username: impl Into<String>,
    ) -> Self {
        Self {
            store,
            hasher,
            reserved_username: reserved_username.into(),
        }
    }

    pub fn is_reserved(&self, username: &str) -> bool {
        username.trim().eq_ignore_ascii_case(&self.reserved_username)
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Builds an unsaved user with a hashed password. Duplicates are only
    /// detected when the record is stored.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<NewUser, AppError> {
        Ok(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: self.hasher.hash(password)?,
        })
    }

    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn signup(&self, form: &SignupForm) -> Result<User, AppError> {
        form.validate()?;
        if self.is_reserved(&form.username) {
            return Err(AppError::ValidationError("Username is reserved".to_string()));
        }

        let new_user = self.register(&form.name, &form.email, &form.username, &form.password)?;
        let user = self.store.create_user(&new_user).await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Creates the account holding the reserved username unless it exists.
    #[instrument(skip(self, admin), fields(email = %admin.email))]
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> Result<User, AppError> {
        if let Some(existing) = self
            .store
            .find_user_by_username(&self.reserved_username)
            .await?
        {
            info!(user_id = existing.id, "Admin account already present");
            return Ok(existing);
        }

        let new_user = self.register(
            &admin.name,
            &admin.email,
            &self.reserved_username,
            &admin.password,
        )?;
        let user = self.store.create_user(&new_user).await?;

        info!(user_id = user.id, "Admin account created");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome, AppError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            self.hasher.verify_unknown(password);
            info!("Login rejected");
            return Ok(AuthOutcome::Rejected);
        };

        if !self.hasher.verify(&user.password, password) {
            info!("Login rejected");
            return Ok(AuthOutcome::Rejected);
        }

        self.store.touch_last_login(user.id).await?;
        info!(user_id = user.id, "Login accepted");

        // Re-read so the caller sees the refreshed last_login.
        let user = self.store.find_user_by_id(user.id).await?.unwrap_or(user);
        Ok(AuthOutcome::Authenticated(user))
    }
}
