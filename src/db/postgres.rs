use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        ContentItem, Interaction, InteractionKind, InteractionRecord, PreferenceModel,
        PreferencePatch,
    },
};

use super::{ContentStore, Counter, ItemOrder, ItemQuery};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const VIDEO_COLUMNS: &str = "id, title, description, video_url, poster_url, creator_id, tags, \
     views, likes, dislikes, duration, is_preview, quality_score, created_at";

/// Row shape of the `videos` table
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    video_url: String,
    poster_url: Option<String>,
    creator_id: Uuid,
    tags: Option<Vec<String>>,
    views: i64,
    likes: i64,
    dislikes: i64,
    duration: Option<i32>,
    is_preview: bool,
    quality_score: Option<f64>,
    created_at: DateTime<Utc>,
}

impl From<VideoRow> for ContentItem {
    fn from(row: VideoRow) -> Self {
        ContentItem {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            video_url: row.video_url,
            poster_url: row.poster_url.unwrap_or_default(),
            creator_id: row.creator_id,
            tags: row.tags.unwrap_or_default(),
            views: row.views,
            likes: row.likes,
            dislikes: row.dislikes,
            duration: row.duration.unwrap_or_default(),
            is_preview: row.is_preview,
            quality_score: row.quality_score.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PreferencesRow {
    preferred_tags: Option<Vec<String>>,
    muted_channels: Option<Vec<Uuid>>,
}

impl From<PreferencesRow> for PreferenceModel {
    fn from(row: PreferencesRow) -> Self {
        PreferenceModel {
            preferred_tags: row.preferred_tags.unwrap_or_default(),
            muted_channels: row.muted_channels.unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InteractionRow {
    video_id: Uuid,
    interaction_type: String,
}

impl TryFrom<InteractionRow> for InteractionRecord {
    type Error = AppError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let kind = row
            .interaction_type
            .parse::<InteractionKind>()
            .map_err(AppError::Internal)?;
        Ok(InteractionRecord {
            content_id: row.video_id,
            kind,
        })
    }
}

/// Content store backed by PostgreSQL
///
/// Expects the `videos`, `user_preferences` and `user_interactions` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the SELECT for an item query
    fn build_item_query(query: &ItemQuery) -> QueryBuilder<'static, Postgres> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM videos WHERE TRUE", VIDEO_COLUMNS));

        if let Some(is_preview) = query.is_preview {
            builder.push(" AND is_preview = ").push_bind(is_preview);
        }
        if let Some(min_quality) = query.min_quality {
            builder.push(" AND quality_score >= ").push_bind(min_quality);
        }
        if !query.exclude_ids.is_empty() {
            builder
                .push(" AND NOT (id = ANY(")
                .push_bind(query.exclude_ids.clone())
                .push("))");
        }

        builder.push(match query.order_by {
            ItemOrder::CreatedAtDesc => " ORDER BY created_at DESC, id ASC",
            ItemOrder::QualityScoreDesc => " ORDER BY quality_score DESC, created_at DESC, id ASC",
        });
        builder.push(" LIMIT ").push_bind(query.limit as i64);

        builder
    }
}

#[async_trait::async_trait]
impl ContentStore for PgStore {
    async fn query_items(&self, query: &ItemQuery) -> AppResult<Vec<ContentItem>> {
        let mut builder = Self::build_item_query(query);
        let rows: Vec<VideoRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ContentItem::from).collect())
    }

    async fn get_item(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        let row: Option<VideoRow> =
            sqlx::query_as(&format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS))
                .bind(content_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(ContentItem::from))
    }

    async fn query_preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceModel>> {
        let row: Option<PreferencesRow> = sqlx::query_as(
            r#"
            SELECT preferred_tags, muted_channels
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PreferenceModel::from))
    }

    async fn query_interactions(
        &self,
        user_id: Uuid,
        kinds: &[InteractionKind],
    ) -> AppResult<Vec<InteractionRecord>> {
        let kinds: Vec<&str> = kinds.iter().map(InteractionKind::as_str).collect();

        let rows: Vec<InteractionRow> = sqlx::query_as(
            r#"
            SELECT video_id, interaction_type
            FROM user_interactions
            WHERE user_id = $1 AND interaction_type = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(&kinds)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match InteractionRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable interaction row"),
            }
        }
        Ok(records)
    }

    async fn upsert_preferences(&self, user_id: Uuid, patch: &PreferencePatch) -> AppResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, preferred_tags, muted_channels)
            VALUES ($1, COALESCE($2, '{}'::text[]), COALESCE($3, '{}'::uuid[]))
            ON CONFLICT (user_id) DO UPDATE SET
                preferred_tags = COALESCE($2, user_preferences.preferred_tags),
                muted_channels = COALESCE($3, user_preferences.muted_channels)
            "#,
        )
        .bind(user_id)
        .bind(&patch.preferred_tags)
        .bind(&patch.muted_channels)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_counter(
        &self,
        content_id: Uuid,
        counter: Counter,
        delta: i64,
    ) -> AppResult<()> {
        let column = counter.column();
        let result = sqlx::query(&format!(
            "UPDATE videos SET {column} = {column} + $1 WHERE id = $2"
        ))
        .bind(delta)
        .bind(content_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("content item {}", content_id)));
        }
        Ok(())
    }

    async fn insert_interaction(&self, interaction: &Interaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_interactions (user_id, video_id, interaction_type, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(interaction.user_id)
        .bind(interaction.content_id)
        .bind(interaction.kind.as_str())
        .bind(interaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_interactions(&self, content_id: Uuid, kind: InteractionKind) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_interactions
            WHERE video_id = $1 AND interaction_type = $2
            "#,
        )
        .bind(content_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_quality_score(&self, content_id: Uuid, score: f64) -> AppResult<()> {
        let result = sqlx::query("UPDATE videos SET quality_score = $1 WHERE id = $2")
            .bind(score)
            .bind(content_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("content item {}", content_id)));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
