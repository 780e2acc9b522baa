use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{Discussion, DiscussionQuery, DiscussionRepository, DiscussionSort, DomainError, Page, Result};
use uuid::Uuid;

use super::{internal, is_foreign_key_violation, like_pattern, PgStore};

#[derive(sqlx::FromRow)]
struct DiscussionRow {
    id: Uuid,
    user_id: Uuid,
    title: Option<String>,
    analyses_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DiscussionRow> for Discussion {
    fn from(row: DiscussionRow) -> Self {
        Discussion {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            analyses_count: row.analyses_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_DISCUSSION: &str = "SELECT d.id, d.user_id, d.title, d.created_at, d.updated_at, \
     (SELECT COUNT(*) FROM analyses a WHERE a.discussion_id = d.id) AS analyses_count \
     FROM discussions d";

const LIST_FILTER: &str = "WHERE ($1::uuid IS NULL OR d.user_id = $1) \
     AND ($2::text IS NULL OR d.title ILIKE $2 ESCAPE '\\')";

fn order_clause(query: &DiscussionQuery) -> String {
    let column = match query.ordering.field {
        DiscussionSort::CreatedAt => "d.created_at",
        DiscussionSort::UpdatedAt => "d.updated_at",
    };
    let direction = if query.ordering.descending { "DESC" } else { "ASC" };
    format!("ORDER BY {column} {direction}, d.id {direction}")
}

#[async_trait]
impl DiscussionRepository for PgStore {
    async fn create(&self, discussion: Discussion) -> Result<Discussion> {
        sqlx::query(
            "INSERT INTO discussions (id, user_id, title, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(discussion.id)
        .bind(discussion.user_id)
        .bind(&discussion.title)
        .bind(discussion.created_at)
        .bind(discussion.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DomainError::not_found("user", discussion.user_id)
            } else {
                internal(e)
            }
        })?;
        Ok(Discussion { analyses_count: 0, ..discussion })
    }

    async fn get(&self, id: Uuid) -> Result<Option<Discussion>> {
        let sql = format!("{SELECT_DISCUSSION} WHERE d.id = $1");
        let row = sqlx::query_as::<_, DiscussionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(internal)?;
        Ok(row.map(Discussion::from))
    }

    async fn list(&self, query: DiscussionQuery) -> Result<Page<Discussion>> {
        let pattern = like_pattern(query.search.as_deref());

        let count_sql = format!("SELECT COUNT(*) FROM discussions d {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(query.owner)
            .bind(&pattern)
            .fetch_one(self.pool())
            .await
            .map_err(internal)?;

        let sql = format!("{SELECT_DISCUSSION} {LIST_FILTER} {} LIMIT $3 OFFSET $4", order_clause(&query));
        let rows = sqlx::query_as::<_, DiscussionRow>(&sql)
            .bind(query.owner)
            .bind(&pattern)
            .bind(query.page.limit())
            .bind(query.page.offset())
            .fetch_all(self.pool())
            .await
            .map_err(internal)?;

        Ok(Page::new(rows.into_iter().map(Discussion::from).collect(), total, query.page))
    }

    async fn set_title(&self, id: Uuid, title: Option<String>) -> Result<Discussion> {
        let updated = sqlx::query("UPDATE discussions SET title = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(self.pool())
            .await
            .map_err(internal)?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("discussion", id));
        }
        self.get(id).await?.ok_or_else(|| DomainError::not_found("discussion", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }
}
