//! # Domain Models
//!
//! These structs represent the core entities of TruthBot:
//! `User 1—* Discussion 1—* Analysis`.
//! Identifiers are random UUID v4 values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name used when addressing the user: full name if set, else username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn requester(&self) -> Requester {
        Requester { user_id: self.id, is_admin: self.is_admin }
    }
}

/// Insert payload for a user. The hash is computed by the auth service.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

/// Identity of whoever is performing a Discussion/Analysis operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Requester {
    /// Owner-or-admin rule applied to every discussion-scoped operation.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.user_id == owner_id
    }
}

/// A user-owned container grouping related analyses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discussion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    /// Computed by the store on read; not a column.
    pub analyses_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discussion {
    pub fn new(user_id: Uuid, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            analyses_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Kind of content submitted for scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    Tweet,
    Article,
}

impl ContentType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "TEXT",
            ContentType::Image => "IMAGE",
            ContentType::Tweet => "TWEET",
            ContentType::Article => "ARTICLE",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(ContentType::Text),
            "IMAGE" => Ok(ContentType::Image),
            "TWEET" => Ok(ContentType::Tweet),
            "ARTICLE" => Ok(ContentType::Article),
            other => Err(DomainError::Validation(format!("unknown content type '{other}'"))),
        }
    }
}

/// One scored submission of content within a discussion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub id: Uuid,
    pub discussion_id: Uuid,
    /// Owner of the parent discussion, joined in on read. The analyses
    /// table has no user column.
    pub user_id: Uuid,
    pub content: String,
    pub content_type: ContentType,
    /// `None` when scoring failed. Always within `[0, 100]` otherwise.
    pub reliability_score: Option<f64>,
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for an analysis, produced after the gateway has run.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub discussion_id: Uuid,
    pub content: String,
    pub content_type: ContentType,
    pub reliability_score: Option<f64>,
    pub explanation: Option<String>,
}

/// Partial update of the user-editable analysis fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisPatch {
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
}

impl AnalysisPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.content_type.is_none()
    }
}

/// Structured result of a reliability scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    pub score: f64,
    pub explanation: String,
}

/// Speaker of a chat turn as understood by the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in the provider-neutral completion format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`, 0-3.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: u8,
    pub explanation: String,
}

impl QuizQuestion {
    pub const OPTION_COUNT: usize = 4;

    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() == Self::OPTION_COUNT
            && usize::from(self.correct_answer) < Self::OPTION_COUNT
    }
}

/// A signed bearer token as handed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn bearer(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self { access_token, token_type: "bearer", expires_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            password_hash: "$argon2id$...".into(),
            full_name: full_name.map(Into::into),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(user(Some("Alice Martin")).display_name(), "Alice Martin");
        assert_eq!(user(Some("   ")).display_name(), "alice");
        assert_eq!(user(None).display_name(), "alice");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(user(None)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn requester_access_rule() {
        let owner = Uuid::new_v4();
        let stranger = Requester { user_id: Uuid::new_v4(), is_admin: false };
        let admin = Requester { user_id: Uuid::new_v4(), is_admin: true };
        let me = Requester { user_id: owner, is_admin: false };
        assert!(!stranger.can_access(owner));
        assert!(admin.can_access(owner));
        assert!(me.can_access(owner));
    }

    #[test]
    fn content_type_wire_format() {
        assert_eq!(serde_json::to_string(&ContentType::Tweet).unwrap(), "\"TWEET\"");
        assert_eq!("ARTICLE".parse::<ContentType>().unwrap(), ContentType::Article);
        assert!("article".parse::<ContentType>().is_err());
        assert_eq!(ContentType::default(), ContentType::Text);
    }

    #[test]
    fn quiz_question_uses_camel_case_answer_key() {
        let q: QuizQuestion = serde_json::from_value(serde_json::json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctAnswer": 2,
            "explanation": "because"
        }))
        .unwrap();
        assert_eq!(q.correct_answer, 2);
        assert!(q.is_well_formed());

        let bad = QuizQuestion { options: vec!["a".into()], ..q };
        assert!(!bad.is_well_formed());
    }
}
