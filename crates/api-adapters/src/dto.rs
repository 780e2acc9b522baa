//! Request and response bodies that differ from the domain types.

use std::str::FromStr;

use domains::{AnalysisPatch, ChatMessage, ContentType, DomainError, Ordering, Page, PageRequest};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// JSON body or OAuth2 password form; extra form fields are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub message: String,
}

/// One prior turn in the `{role, parts: [{text}]}` shape the web client sends.
#[derive(Debug, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<ChatPart>,
}

#[derive(Debug, Deserialize)]
pub struct ChatPart {
    #[serde(default)]
    pub text: String,
}

impl From<ChatTurn> for ChatMessage {
    /// `"user"` stays the user; any other role is replayed as the assistant.
    fn from(turn: ChatTurn) -> Self {
        let text: String = turn.parts.into_iter().map(|p| p.text).collect();
        if turn.role == "user" {
            ChatMessage::user(text)
        } else {
            ChatMessage::assistant(text)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDiscussionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDiscussionRequest {
    /// Absent: unchanged. `null`: cleared.
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnalysisRequest {
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
}

/// Score and explanation are read-only and ignored if sent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnalysisRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
}

impl From<UpdateAnalysisRequest> for AnalysisPatch {
    fn from(req: UpdateAnalysisRequest) -> Self {
        AnalysisPatch { content: req.content, content_type: req.content_type }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `?page=&page_size=&search=&ordering=`, parsed by hand so every failure is a 400 in the usual body.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        let page = parse_number(self.page.as_deref(), "page")?;
        let page_size = parse_number(self.page_size.as_deref(), "page_size")?;
        Ok(PageRequest::new(page, page_size)?)
    }

    pub fn ordering<F>(&self) -> Result<Ordering<F>, ApiError>
    where
        F: FromStr<Err = DomainError>,
        Ordering<F>: Default,
    {
        match self.ordering.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            Some(key) => Ok(key.parse()?),
            None => Ok(Ordering::default()),
        }
    }

    pub fn search(&self) -> Option<String> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }
}

fn parse_number(raw: Option<&str>, name: &str) -> Result<Option<u32>, ApiError> {
    raw.map(|v| v.trim().parse::<u32>().map_err(|_| ApiError::validation(format!("{name} must be a positive integer"))))
        .transpose()
}

/// `{count, next, previous, results}` with page numbers as links.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> TryFrom<Page<T>> for Paginated<T> {
    type Error = ApiError;

    fn try_from(page: Page<T>) -> Result<Self, Self::Error> {
        if page.is_out_of_range() {
            return Err(DomainError::not_found("page", page.page).into());
        }
        Ok(Self { count: page.total, next: page.next(), previous: page.previous(), results: page.items })
    }
}
