use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Analysis, AnalysisPatch, AnalysisQuery, AnalysisRepository, AnalysisSort, ContentType, DomainError,
    NewAnalysis, Page, Result,
};
use uuid::Uuid;

use super::{internal, is_foreign_key_violation, like_pattern, PgStore};

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    discussion_id: Uuid,
    user_id: Uuid,
    content: String,
    content_type: String,
    reliability_score: Option<f64>,
    explanation: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = DomainError;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        Ok(Analysis {
            id: row.id,
            discussion_id: row.discussion_id,
            user_id: row.user_id,
            content: row.content,
            content_type: row.content_type.parse::<ContentType>()?,
            reliability_score: row.reliability_score,
            explanation: row.explanation,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Analyses carry no owner column; it is always the discussion's.
const SELECT_ANALYSIS: &str = "SELECT a.id, a.discussion_id, d.user_id, a.content, a.content_type, \
     a.reliability_score, a.explanation, a.created_at, a.updated_at \
     FROM analyses a JOIN discussions d ON d.id = a.discussion_id";

const LIST_FILTER: &str = "WHERE a.discussion_id = $1 AND ($2::text IS NULL OR a.content ILIKE $2 ESCAPE '\\')";

fn order_clause(query: &AnalysisQuery) -> String {
    let column = match query.ordering.field {
        AnalysisSort::CreatedAt => "a.created_at",
        // PostgreSQL puts NULL last ascending and first descending.
        AnalysisSort::ReliabilityScore => "a.reliability_score",
    };
    let direction = if query.ordering.descending { "DESC" } else { "ASC" };
    format!("ORDER BY {column} {direction}, a.id {direction}")
}

fn collect(rows: Vec<AnalysisRow>) -> Result<Vec<Analysis>> {
    rows.into_iter().map(Analysis::try_from).collect()
}

impl PgStore {
    async fn fetch_analysis(&self, id: Uuid) -> Result<Option<Analysis>> {
        let sql = format!("{SELECT_ANALYSIS} WHERE a.id = $1");
        sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(internal)?
            .map(Analysis::try_from)
            .transpose()
    }
}

#[async_trait]
impl AnalysisRepository for PgStore {
    async fn create(&self, analysis: NewAnalysis) -> Result<Analysis> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO analyses (id, discussion_id, content, content_type, reliability_score, explanation) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(analysis.discussion_id)
        .bind(&analysis.content)
        .bind(analysis.content_type.as_str())
        .bind(analysis.reliability_score)
        .bind(&analysis.explanation)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DomainError::not_found("discussion", analysis.discussion_id)
            } else {
                internal(e)
            }
        })?;
        self.fetch_analysis(id).await?.ok_or_else(|| DomainError::not_found("analysis", id))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        self.fetch_analysis(id).await
    }

    async fn list(&self, query: AnalysisQuery) -> Result<Page<Analysis>> {
        let pattern = like_pattern(query.search.as_deref());

        let count_sql = format!("SELECT COUNT(*) FROM analyses a {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(query.discussion_id)
            .bind(&pattern)
            .fetch_one(self.pool())
            .await
            .map_err(internal)?;

        let sql = format!("{SELECT_ANALYSIS} {LIST_FILTER} {} LIMIT $3 OFFSET $4", order_clause(&query));
        let rows = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(query.discussion_id)
            .bind(&pattern)
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(self.pool())
            .await
            .map_err(internal)?;

        Ok(Page::new(collect(rows)?, total, query.page))
    }

    async fn list_all(&self, discussion_id: Uuid) -> Result<Vec<Analysis>> {
        let sql = format!("{SELECT_ANALYSIS} WHERE a.discussion_id = $1 ORDER BY a.created_at DESC, a.id DESC");
        let rows = sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(discussion_id)
            .fetch_all(self.pool())
            .await
            .map_err(internal)?;
        collect(rows)
    }

    async fn first(&self, discussion_id: Uuid) -> Result<Option<Analysis>> {
        let sql = format!("{SELECT_ANALYSIS} WHERE a.discussion_id = $1 ORDER BY a.created_at ASC, a.id ASC LIMIT 1");
        sqlx::query_as::<_, AnalysisRow>(&sql)
            .bind(discussion_id)
            .fetch_optional(self.pool())
            .await
            .map_err(internal)?
            .map(Analysis::try_from)
            .transpose()
    }

    async fn update(&self, id: Uuid, patch: AnalysisPatch) -> Result<Analysis> {
        let result = sqlx::query(
            "UPDATE analyses SET content = COALESCE($2, content), \
             content_type = COALESCE($3, content_type), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(patch.content)
        .bind(patch.content_type.map(|t| t.as_str()))
        .execute(self.pool())
        .await
        .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("analysis", id));
        }
        self.fetch_analysis(id).await?.ok_or_else(|| DomainError::not_found("analysis", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }
}
