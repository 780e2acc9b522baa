//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::models::{Analysis, AnalysisPatch, ChatMessage, Discussion, NewAnalysis, NewUser, User};
use crate::pagination::{AnalysisQuery, DiscussionQuery, Page};

/// Credential store.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<()>;
}

/// Discussion persistence. Reads fill in `analyses_count`.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DiscussionRepository: Send + Sync {
    async fn create(&self, discussion: Discussion) -> Result<Discussion>;
    async fn get(&self, id: Uuid) -> Result<Option<Discussion>>;
    async fn list(&self, query: DiscussionQuery) -> Result<Page<Discussion>>;
    /// Sets the title and bumps `updated_at`.
    async fn set_title(&self, id: Uuid, title: Option<String>) -> Result<Discussion>;
    /// Removes the discussion and all of its analyses. Returns `false` if absent.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Analysis persistence. Reads fill in `user_id` from the parent discussion.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn create(&self, analysis: NewAnalysis) -> Result<Analysis>;
    async fn get(&self, id: Uuid) -> Result<Option<Analysis>>;
    async fn list(&self, query: AnalysisQuery) -> Result<Page<Analysis>>;
    /// Every analysis of a discussion, newest first.
    async fn list_all(&self, discussion_id: Uuid) -> Result<Vec<Analysis>>;
    /// Earliest-created analysis of a discussion.
    async fn first(&self, discussion_id: Uuid) -> Result<Option<Analysis>>;
    async fn update(&self, id: Uuid, patch: AnalysisPatch) -> Result<Analysis>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// One-way salted password hashing.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    /// `false` for a mismatch or an unparseable hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Signed, expiring bearer tokens. No server-side session store.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait TokenService: Send + Sync {
    /// Returns the token and its absolute expiry.
    fn issue(&self, username: &str) -> Result<(String, DateTime<Utc>)>;
    /// Fails with `Unauthorized` on a bad signature, malformed token or past expiry.
    fn verify(&self, token: &str) -> Result<TokenSubject>;
}

/// A single round-trip to an OpenAI-compatible completion endpoint.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> std::result::Result<String, GatewayError>;
}
