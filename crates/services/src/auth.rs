//! Registration, login and bearer-token authentication.

use std::sync::Arc;

use domains::{AccessToken, DomainError, NewUser, PasswordHasher, Result, TokenService, User, UserRepository};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

const BAD_CREDENTIALS: &str = "Incorrect username or password";
const INVALID_TOKEN: &str = "Could not validate credentials";
const MAX_USERNAME_LEN: usize = 150;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    /// Hash verified against when the username is unknown, so both failure
    /// paths cost one verification.
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self { users, hasher, tokens, dummy_hash: OnceCell::new() }
    }

    /// Creates the account and returns a token for it.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<AccessToken> {
        let username = validate_credentials(username, password)?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(DomainError::Conflict("Username already registered".into()));
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                full_name: full_name.filter(|n| !n.trim().is_empty()),
                is_admin: false,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        self.issue(&user.username)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        match self.users.find_by_username(username.trim()).await? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => {
                debug!(user_id = %user.id, "login succeeded");
                self.issue(&user.username)
            }
            Some(user) => {
                info!(user_id = %user.id, "login rejected: wrong password");
                Err(DomainError::Unauthorized(BAD_CREDENTIALS.into()))
            }
            None => {
                self.equalise_timing(password);
                info!("login rejected: unknown username");
                Err(DomainError::Unauthorized(BAD_CREDENTIALS.into()))
            }
        }
    }

    /// Resolves a bearer token to the stored user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let subject = self.tokens.verify(token)?;
        self.users
            .find_by_username(&subject.username)
            .await?
            .ok_or_else(|| DomainError::Unauthorized(INVALID_TOKEN.into()))
    }

    /// Like [`AuthService::authenticate`] but a missing or invalid token
    /// yields `None`. Storage failures are still errors.
    pub async fn authenticate_optional(&self, token: Option<&str>) -> Result<Option<User>> {
        let Some(token) = token else {
            return Ok(None);
        };
        match self.authenticate(token).await {
            Ok(user) => Ok(Some(user)),
            Err(DomainError::Unauthorized(reason)) => {
                debug!(%reason, "ignoring invalid optional credentials");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates an administrator, or promotes the existing account of that name.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<User> {
        let username = validate_credentials(username, password)?;

        if let Some(existing) = self.users.find_by_username(username).await? {
            self.users.set_admin(existing.id, true).await?;
            warn!(user_id = %existing.id, "existing user promoted to admin; password unchanged");
            return Ok(User { is_admin: true, ..existing });
        }

        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash: self.hasher.hash(password)?,
                full_name,
                is_admin: true,
            })
            .await?;
        info!(user_id = %user.id, "admin created");
        Ok(user)
    }

    fn issue(&self, username: &str) -> Result<AccessToken> {
        let (token, expires_at) = self.tokens.issue(username)?;
        Ok(AccessToken::bearer(token, expires_at))
    }

    fn equalise_timing(&self, password: &str) {
        match self.dummy_hash.get_or_try_init(|| self.hasher.hash("truthbot-login-timing")) {
            Ok(hash) => {
                let _ = self.hasher.verify(password, hash);
            }
            Err(e) => warn!(error = %e, "could not prepare dummy hash"),
        }
    }
}

fn validate_credentials<'a>(username: &'a str, password: &str) -> Result<&'a str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation("username must not be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(DomainError::Validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if password.is_empty() {
        return Err(DomainError::Validation("password must not be empty".into()));
    }
    Ok(username)
}
