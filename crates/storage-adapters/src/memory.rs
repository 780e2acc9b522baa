//! # In-memory store
//!
//! DashMap-backed implementation of every repository port. Used when no
//! database URL is configured and by the HTTP test-suite. Mirrors the
//! PostgreSQL adapter: unique usernames, cascading deletes, NULL scores
//! sorting as the largest value.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    Analysis, AnalysisPatch, AnalysisQuery, AnalysisRepository, AnalysisSort, Discussion, DiscussionQuery,
    DiscussionRepository, DiscussionSort, DomainError, NewAnalysis, NewUser, Page, PageRequest, Result, User,
    UserRepository,
};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: DashMap<Uuid, User>,
    usernames: DashMap<String, Uuid>,
    discussions: DashMap<Uuid, Discussion>,
    /// Insertion sequence breaks `created_at` ties.
    analyses: DashMap<Uuid, (u64, Analysis)>,
    seq: AtomicU64,
}

/// Cheap to clone; clones share the same maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn analyses_count(&self, discussion_id: Uuid) -> i64 {
        let count = self.inner.analyses.iter().filter(|e| e.value().1.discussion_id == discussion_id).count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn with_count(&self, mut discussion: Discussion) -> Discussion {
        discussion.analyses_count = self.analyses_count(discussion.id);
        discussion
    }

    fn analyses_of(&self, discussion_id: Uuid) -> Vec<(u64, Analysis)> {
        self.inner
            .analyses
            .iter()
            .filter(|e| e.value().1.discussion_id == discussion_id)
            .map(|e| e.value().clone())
            .collect()
    }
}

fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let window = items.into_iter().skip(offset).take(limit).collect();
    Page::new(window, total, request)
}

fn matches_search(haystack: Option<&str>, search: Option<&str>) -> bool {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        None => true,
        Some(needle) => haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
    }
}

/// SQL ordering for nullable scores: NULL sorts above every number.
fn cmp_scores(a: Option<f64>, b: Option<f64>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let id = Uuid::new_v4();
        match self.inner.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict("Username already registered".into())),
            Entry::Vacant(slot) => {
                slot.insert(id);
                let stored = User {
                    id,
                    username: user.username,
                    password_hash: user.password_hash,
                    full_name: user.full_name,
                    is_admin: user.is_admin,
                    created_at: Utc::now(),
                };
                self.inner.users.insert(id, stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let Some(id) = self.inner.usernames.get(username).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.inner.users.get(&id).map(|e| e.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.users.get(&id).map(|e| e.value().clone()))
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<()> {
        let mut user = self.inner.users.get_mut(&id).ok_or_else(|| DomainError::not_found("user", id))?;
        user.is_admin = is_admin;
        Ok(())
    }
}

#[async_trait]
impl DiscussionRepository for MemoryStore {
    async fn create(&self, discussion: Discussion) -> Result<Discussion> {
        if !self.inner.users.contains_key(&discussion.user_id) {
            return Err(DomainError::not_found("user", discussion.user_id));
        }
        let stored = Discussion { analyses_count: 0, ..discussion };
        self.inner.discussions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Discussion>> {
        let found = self.inner.discussions.get(&id).map(|e| e.value().clone());
        Ok(found.map(|d| self.with_count(d)))
    }

    async fn list(&self, query: DiscussionQuery) -> Result<Page<Discussion>> {
        let mut rows: Vec<Discussion> = self
            .inner
            .discussions
            .iter()
            .map(|e| e.value().clone())
            .filter(|d| query.owner.map_or(true, |owner| d.user_id == owner))
            .filter(|d| matches_search(d.title.as_deref(), query.search.as_deref()))
            .collect();

        rows.sort_by(|a, b| {
            let ord = match query.ordering.field {
                DiscussionSort::CreatedAt => a.created_at.cmp(&b.created_at),
                DiscussionSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            if query.ordering.descending { ord.reverse() } else { ord }
        });

        Ok(paginate(rows, query.page).map(|d| self.with_count(d)))
    }

    async fn set_title(&self, id: Uuid, title: Option<String>) -> Result<Discussion> {
        let updated = {
            let mut entry = self
                .inner
                .discussions
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("discussion", id))?;
            entry.title = title;
            entry.updated_at = Utc::now();
            entry.value().clone()
        };
        Ok(self.with_count(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        if self.inner.discussions.remove(&id).is_none() {
            return Ok(false);
        }
        self.inner.analyses.retain(|_, (_, a)| a.discussion_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AnalysisRepository for MemoryStore {
    async fn create(&self, analysis: NewAnalysis) -> Result<Analysis> {
        // Held until the insert so a concurrent discussion delete cannot run in between.
        let parent = self
            .inner
            .discussions
            .get(&analysis.discussion_id)
            .ok_or_else(|| DomainError::not_found("discussion", analysis.discussion_id))?;
        let user_id = parent.user_id;

        let now = Utc::now();
        let stored = Analysis {
            id: Uuid::new_v4(),
            discussion_id: analysis.discussion_id,
            user_id,
            content: analysis.content,
            content_type: analysis.content_type,
            reliability_score: analysis.reliability_score,
            explanation: analysis.explanation,
            created_at: now,
            updated_at: now,
        };
        let seq = self.inner.seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.analyses.insert(stored.id, (seq, stored.clone()));
        drop(parent);
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        Ok(self.inner.analyses.get(&id).map(|e| e.value().1.clone()))
    }

    async fn list(&self, query: AnalysisQuery) -> Result<Page<Analysis>> {
        let mut rows: Vec<(u64, Analysis)> = self
            .analyses_of(query.discussion_id)
            .into_iter()
            .filter(|(_, a)| matches_search(Some(&a.content), query.search.as_deref()))
            .collect();

        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            let ord = match query.ordering.field {
                AnalysisSort::CreatedAt => a.created_at.cmp(&b.created_at).then(seq_a.cmp(seq_b)),
                AnalysisSort::ReliabilityScore => cmp_scores(a.reliability_score, b.reliability_score),
            };
            if query.ordering.descending { ord.reverse() } else { ord }
        });

        Ok(paginate(rows, query.page).map(|(_, a)| a))
    }

    async fn list_all(&self, discussion_id: Uuid) -> Result<Vec<Analysis>> {
        let mut rows = self.analyses_of(discussion_id);
        rows.sort_by(|(seq_a, a), (seq_b, b)| b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a)));
        Ok(rows.into_iter().map(|(_, a)| a).collect())
    }

    async fn first(&self, discussion_id: Uuid) -> Result<Option<Analysis>> {
        Ok(self
            .analyses_of(discussion_id)
            .into_iter()
            .min_by(|(seq_a, a), (seq_b, b)| a.created_at.cmp(&b.created_at).then(seq_a.cmp(seq_b)))
            .map(|(_, a)| a))
    }

    async fn update(&self, id: Uuid, patch: AnalysisPatch) -> Result<Analysis> {
        let mut entry = self.inner.analyses.get_mut(&id).ok_or_else(|| DomainError::not_found("analysis", id))?;
        let (_, analysis) = entry.value_mut();
        if let Some(content) = patch.content {
            analysis.content = content;
        }
        if let Some(content_type) = patch.content_type {
            analysis.content_type = content_type;
        }
        analysis.updated_at = Utc::now();
        Ok(analysis.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.analyses.remove(&id).is_some())
    }
}
