//! Analyses inside a discussion. Creation scores the content synchronously.

use std::sync::Arc;

use domains::{
    Analysis, AnalysisPatch, AnalysisQuery, AnalysisRepository, ContentType, DiscussionRepository,
    DomainError, NewAnalysis, Page, Requester, Result,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::discussions::authorize;
use crate::gateway::Gateway;

pub struct AnalysisService {
    discussions: Arc<dyn DiscussionRepository>,
    analyses: Arc<dyn AnalysisRepository>,
    gateway: Gateway,
}

impl AnalysisService {
    pub fn new(
        discussions: Arc<dyn DiscussionRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        gateway: Gateway,
    ) -> Self {
        Self { discussions, analyses, gateway }
    }

    /// Scores `content` and stores the result. A gateway failure is recorded
    /// as a null score with the error as explanation; it never fails the call.
    pub async fn create(
        &self,
        requester: Requester,
        discussion_id: Uuid,
        content: String,
        content_type: ContentType,
    ) -> Result<Analysis> {
        authorize(self.discussions.as_ref(), requester, discussion_id).await?;
        validate_content(&content)?;

        let (reliability_score, explanation) = match self.gateway.score_content(&content).await {
            Ok(assessment) => (Some(assessment.score), Some(assessment.explanation)),
            Err(e) => {
                warn!(%discussion_id, error = %e, "scoring failed; storing analysis without score");
                (None, Some(format!("Analysis failed: {e}")))
            }
        };

        let analysis = self
            .analyses
            .create(NewAnalysis { discussion_id, content, content_type, reliability_score, explanation })
            .await?;
        info!(analysis_id = %analysis.id, %discussion_id, score = ?analysis.reliability_score, "analysis created");
        Ok(analysis)
    }

    pub async fn list(&self, requester: Requester, query: AnalysisQuery) -> Result<Page<Analysis>> {
        authorize(self.discussions.as_ref(), requester, query.discussion_id).await?;
        self.analyses.list(query).await
    }

    pub async fn get(&self, requester: Requester, discussion_id: Uuid, id: Uuid) -> Result<Analysis> {
        authorize(self.discussions.as_ref(), requester, discussion_id).await?;
        self.load(discussion_id, id).await
    }

    /// Edits content fields only; score and explanation are left as computed.
    pub async fn update(
        &self,
        requester: Requester,
        discussion_id: Uuid,
        id: Uuid,
        patch: AnalysisPatch,
    ) -> Result<Analysis> {
        authorize(self.discussions.as_ref(), requester, discussion_id).await?;
        let current = self.load(discussion_id, id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        if let Some(content) = &patch.content {
            validate_content(content)?;
        }
        self.analyses.update(id, patch).await
    }

    pub async fn delete(&self, requester: Requester, discussion_id: Uuid, id: Uuid) -> Result<()> {
        authorize(self.discussions.as_ref(), requester, discussion_id).await?;
        self.load(discussion_id, id).await?;
        if !self.analyses.delete(id).await? {
            return Err(DomainError::not_found("analysis", id));
        }
        info!(analysis_id = %id, %discussion_id, "analysis deleted");
        Ok(())
    }

    /// An analysis filed under another discussion counts as missing.
    async fn load(&self, discussion_id: Uuid, id: Uuid) -> Result<Analysis> {
        self.analyses
            .get(id)
            .await?
            .filter(|a| a.discussion_id == discussion_id)
            .ok_or_else(|| DomainError::not_found("analysis", id))
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation("content must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{Discussion, GatewayError, MockAnalysisRepository, MockDiscussionRepository, MockLanguageModel};

    fn stored(new: NewAnalysis, user_id: Uuid) -> Analysis {
        Analysis {
            id: Uuid::new_v4(),
            discussion_id: new.discussion_id,
            user_id,
            content: new.content,
            content_type: new.content_type,
            reliability_score: new.reliability_score,
            explanation: new.explanation,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(owner: Uuid, model: MockLanguageModel, analyses: MockAnalysisRepository) -> (AnalysisService, Uuid) {
        let discussion = Discussion::new(owner, None);
        let id = discussion.id;
        let mut discussions = MockDiscussionRepository::new();
        discussions.expect_get().returning(move |_| Ok(Some(discussion.clone())));
        let svc = AnalysisService::new(Arc::new(discussions), Arc::new(analyses), Gateway::new(Arc::new(model)));
        (svc, id)
    }

    fn echoing_repo(owner: Uuid) -> MockAnalysisRepository {
        let mut analyses = MockAnalysisRepository::new();
        analyses.expect_create().returning(move |new| Ok(stored(new, owner)));
        analyses
    }

    #[tokio::test]
    async fn create_stores_clamped_score() {
        let owner = Uuid::new_v4();
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok(r#"{"score": 150, "explanation": "Overwhelming evidence."}"#.into()));
        let (svc, discussion_id) = service(owner, model, echoing_repo(owner));

        let analysis = svc
            .create(Requester { user_id: owner, is_admin: false }, discussion_id, "Water is wet".into(), ContentType::Text)
            .await
            .unwrap();
        assert_eq!(analysis.reliability_score, Some(100.0));
        assert_eq!(analysis.explanation.as_deref(), Some("Overwhelming evidence."));
    }

    #[tokio::test]
    async fn gateway_failure_still_creates_analysis() {
        let owner = Uuid::new_v4();
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Err(GatewayError::Status { status: 502, message: "bad gateway".into() }));
        let (svc, discussion_id) = service(owner, model, echoing_repo(owner));

        let analysis = svc
            .create(Requester { user_id: owner, is_admin: false }, discussion_id, "Some tweet".into(), ContentType::Tweet)
            .await
            .unwrap();
        assert_eq!(analysis.reliability_score, None);
        assert!(analysis.explanation.unwrap().contains("502"));
        assert_eq!(analysis.content_type, ContentType::Tweet);
    }

    #[tokio::test]
    async fn stranger_cannot_create_or_list() {
        let owner = Uuid::new_v4();
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();
        let mut analyses = MockAnalysisRepository::new();
        analyses.expect_create().never();
        analyses.expect_list().never();
        let (svc, discussion_id) = service(owner, model, analyses);
        let stranger = Requester { user_id: Uuid::new_v4(), is_admin: false };

        let err = svc.create(stranger, discussion_id, "x".into(), ContentType::Text).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = svc.list(stranger, AnalysisQuery::newest_first(discussion_id)).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_scoring() {
        let owner = Uuid::new_v4();
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();
        let (svc, discussion_id) = service(owner, model, MockAnalysisRepository::new());

        let err = svc
            .create(Requester { user_id: owner, is_admin: false }, discussion_id, "  ".into(), ContentType::Text)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn analysis_from_other_discussion_is_not_found() {
        let owner = Uuid::new_v4();
        let mut analyses = MockAnalysisRepository::new();
        analyses.expect_get().returning(move |id| {
            Ok(Some(Analysis {
                id,
                discussion_id: Uuid::new_v4(),
                user_id: owner,
                content: "elsewhere".into(),
                content_type: ContentType::Text,
                reliability_score: None,
                explanation: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        analyses.expect_delete().never();
        let (svc, discussion_id) = service(owner, MockLanguageModel::new(), analyses);

        let me = Requester { user_id: owner, is_admin: false };
        let err = svc.delete(me, discussion_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "analysis", .. }));
    }
}
