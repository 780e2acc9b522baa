//! Discussion lifecycle and the owner-or-admin access rule.

use std::sync::Arc;

use domains::{
    Analysis, AnalysisRepository, Discussion, DiscussionQuery, DiscussionRepository, DomainError,
    Page, Requester, Result,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 50;
const TRUNCATED_TITLE_CHARS: usize = 47;
const MAX_STORED_TITLE_CHARS: usize = 255;

/// A discussion together with its analyses, newest first.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscussionDetail {
    #[serde(flatten)]
    pub discussion: Discussion,
    pub analyses: Vec<Analysis>,
}

pub struct DiscussionService {
    discussions: Arc<dyn DiscussionRepository>,
    analyses: Arc<dyn AnalysisRepository>,
}

impl DiscussionService {
    pub fn new(discussions: Arc<dyn DiscussionRepository>, analyses: Arc<dyn AnalysisRepository>) -> Self {
        Self { discussions, analyses }
    }

    pub async fn create(&self, requester: Requester, title: Option<String>) -> Result<Discussion> {
        let title = normalize_title(title)?;
        let discussion = self.discussions.create(Discussion::new(requester.user_id, title)).await?;
        info!(discussion_id = %discussion.id, user_id = %discussion.user_id, "discussion created");
        Ok(discussion)
    }

    /// Admins see every discussion; everyone else only their own.
    pub async fn list(&self, requester: Requester, mut query: DiscussionQuery) -> Result<Page<Discussion>> {
        query.owner = (!requester.is_admin).then_some(requester.user_id);
        self.discussions.list(query).await
    }

    pub async fn get(&self, requester: Requester, id: Uuid) -> Result<DiscussionDetail> {
        let discussion = authorize(self.discussions.as_ref(), requester, id).await?;
        let analyses = self.analyses.list_all(id).await?;
        Ok(DiscussionDetail { discussion, analyses })
    }

    pub async fn rename(&self, requester: Requester, id: Uuid, title: Option<String>) -> Result<Discussion> {
        authorize(self.discussions.as_ref(), requester, id).await?;
        self.discussions.set_title(id, normalize_title(title)?).await
    }

    pub async fn delete(&self, requester: Requester, id: Uuid) -> Result<()> {
        authorize(self.discussions.as_ref(), requester, id).await?;
        if !self.discussions.delete(id).await? {
            return Err(DomainError::not_found("discussion", id));
        }
        info!(discussion_id = %id, "discussion deleted");
        Ok(())
    }

    /// Titles the discussion after its earliest analysis.
    ///
    /// Fails with `NotFound { entity: "analysis", .. }` if it has none.
    pub async fn generate_title(&self, requester: Requester, id: Uuid) -> Result<Discussion> {
        authorize(self.discussions.as_ref(), requester, id).await?;
        let first = self
            .analyses
            .first(id)
            .await?
            .ok_or_else(|| DomainError::not_found("analysis", format!("first of discussion {id}")))?;
        let title = title_from_content(&first.content);
        self.discussions.set_title(id, Some(title)).await
    }
}

/// Loads a discussion and checks the requester may touch it.
pub(crate) async fn authorize(
    discussions: &dyn DiscussionRepository,
    requester: Requester,
    id: Uuid,
) -> Result<Discussion> {
    let discussion = discussions
        .get(id)
        .await?
        .ok_or_else(|| DomainError::not_found("discussion", id))?;
    if !requester.can_access(discussion.user_id) {
        return Err(DomainError::Forbidden("You do not have access to this discussion".into()));
    }
    Ok(discussion)
}

/// Title heuristic: up to and including the first `?`, else up to the first
/// `.`, else the whole content. Anything longer than 50 characters is
/// cut to 47 plus `...`. Lengths count Unicode scalar values.
pub fn title_from_content(content: &str) -> String {
    let title: String = if let Some(end) = content.find('?') {
        content[..=end].to_string()
    } else if let Some(end) = content.find('.') {
        content[..end].to_string()
    } else {
        content.to_string()
    };

    if title.chars().count() > MAX_TITLE_CHARS {
        let mut cut: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        title
    }
}

fn normalize_title(title: Option<String>) -> Result<Option<String>> {
    let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if title.chars().count() > MAX_STORED_TITLE_CHARS {
        return Err(DomainError::Validation(format!(
            "title must be at most {MAX_STORED_TITLE_CHARS} characters"
        )));
    }
    Ok(Some(title))
}
