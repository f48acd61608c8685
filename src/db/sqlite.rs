use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{AppError, AppResult};
use crate::models::{
    Content, ContentKind, FeedbackKind, HistoryEntry, PreferenceTriple, UserProfile,
};

use super::Store;

const CONTENT_COLUMNS: &str =
    "id, title, genre, depth, features, type, description, rating, likes, dislikes, year";

/// Creates a SQLite connection pool
///
/// The database file is created on first start. In-memory databases are
/// pinned to a single long-lived connection, because every pooled connection
/// would otherwise open its own private database.
pub async fn create_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    Ok(pool)
}

/// SQLite-backed implementation of the [`Store`] repository
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Row structs keep sqlx column mapping out of the domain types.

#[derive(FromRow)]
struct ContentRow {
    id: i64,
    title: String,
    genre: String,
    depth: String,
    features: String,
    #[sqlx(rename = "type")]
    kind: String,
    description: String,
    rating: f64,
    likes: i64,
    dislikes: i64,
    year: i64,
}

impl ContentRow {
    fn into_domain(self) -> Content {
        Content {
            id: self.id,
            title: self.title,
            genre: self.genre,
            depth: self.depth,
            features: self.features,
            kind: ContentKind::from_db(&self.kind),
            description: self.description,
            rating: self.rating,
            likes: self.likes,
            dislikes: self.dislikes,
            year: self.year as i32,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    user_id: i64,
    preferences: String,
    interaction_count: i64,
    last_interaction: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_domain(self) -> AppResult<UserProfile> {
        let preferences: PreferenceTriple = serde_json::from_str(&self.preferences)
            .map_err(|e| {
                AppError::CorruptState(format!(
                    "user {} has malformed stored preferences: {}",
                    self.user_id, e
                ))
            })?;

        Ok(UserProfile {
            user_id: self.user_id,
            preferences,
            interaction_count: self.interaction_count,
            last_interaction: self.last_interaction,
        })
    }
}

#[derive(FromRow)]
struct HistoryRow {
    content_id: i64,
    title: String,
    genre: String,
    #[sqlx(rename = "type")]
    kind: String,
    interaction_type: String,
    timestamp: DateTime<Utc>,
}

impl HistoryRow {
    fn into_domain(self) -> AppResult<HistoryEntry> {
        let feedback = FeedbackKind::from_db(&self.interaction_type).ok_or_else(|| {
            AppError::CorruptState(format!(
                "interaction log holds unknown feedback kind '{}'",
                self.interaction_type
            ))
        })?;

        Ok(HistoryEntry {
            content_id: self.content_id,
            title: self.title,
            genre: self.genre,
            kind: ContentKind::from_db(&self.kind),
            feedback,
            timestamp: self.timestamp,
        })
    }
}

fn push_exclusion(query: &mut QueryBuilder<'_, Sqlite>, exclude: &[i64], lead: &str) {
    if exclude.is_empty() {
        return;
    }
    query.push(lead);
    query.push("id NOT IN (");
    let mut ids = query.separated(", ");
    for id in exclude {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
}

#[async_trait]
impl Store for SqliteStore {
    async fn catalog(&self) -> AppResult<Vec<Content>> {
        let sql = format!("SELECT {} FROM content ORDER BY id ASC", CONTENT_COLUMNS);
        let rows: Vec<ContentRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ContentRow::into_domain).collect())
    }

    async fn content_by_id(&self, id: i64) -> AppResult<Content> {
        let sql = format!("SELECT {} FROM content WHERE id = ?", CONTENT_COLUMNS);
        let row: Option<ContentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ContentRow::into_domain)
            .ok_or_else(|| AppError::NotFound(format!("content {} not found", id)))
    }

    async fn search_catalog(
        &self,
        prefs: &PreferenceTriple,
        exclude: &[i64],
    ) -> AppResult<Vec<Content>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM content WHERE 1=1",
            CONTENT_COLUMNS
        ));

        if !prefs.genre.is_empty() {
            query.push(" AND genre LIKE ");
            query.push_bind(format!("%{}%", prefs.genre));
        }
        if !prefs.depth.is_empty() {
            query.push(" AND depth = ");
            query.push_bind(prefs.depth.clone());
        }
        if !prefs.features.is_empty() {
            query.push(" AND features LIKE ");
            query.push_bind(format!("%{}%", prefs.features));
        }
        push_exclusion(&mut query, exclude, " AND ");

        query.push(" ORDER BY rating DESC, id ASC");

        let rows: Vec<ContentRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ContentRow::into_domain).collect())
    }

    async fn top_rated(&self, exclude: &[i64], limit: u32) -> AppResult<Vec<Content>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM content",
            CONTENT_COLUMNS
        ));

        push_exclusion(&mut query, exclude, " WHERE ");

        query.push(" ORDER BY rating DESC, RANDOM() LIMIT ");
        query.push_bind(limit as i64);

        let rows: Vec<ContentRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ContentRow::into_domain).collect())
    }

    async fn user_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, preferences, interaction_count, last_interaction \
             FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn save_preferences(&self, user_id: i64, prefs: &PreferenceTriple) -> AppResult<()> {
        let preferences = serde_json::to_string(prefs)
            .map_err(|e| AppError::Internal(format!("preference serialization failed: {}", e)))?;

        sqlx::query(
            "INSERT INTO users (user_id, preferences, interaction_count, last_interaction) \
             VALUES (?, ?, 1, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 preferences = excluded.preferences, \
                 interaction_count = interaction_count + 1, \
                 last_interaction = excluded.last_interaction",
        )
        .bind(user_id)
        .bind(preferences)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn seen_content_ids(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT DISTINCT content_id FROM user_interactions WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn recent_history(&self, user_id: i64, limit: u32) -> AppResult<Vec<HistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT ui.content_id, c.title, c.genre, c.type, ui.interaction_type, ui.timestamp \
             FROM user_interactions ui \
             JOIN content c ON ui.content_id = c.id \
             WHERE ui.user_id = ? \
             ORDER BY ui.timestamp DESC, ui.id DESC \
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryRow::into_domain).collect()
    }

    async fn record_feedback(
        &self,
        user_id: i64,
        content_id: i64,
        kind: FeedbackKind,
    ) -> AppResult<Content> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Unknown content must surface before anything is written.
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM content WHERE id = ?")
            .bind(content_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("content {} not found", content_id)));
        }

        sqlx::query(
            "INSERT INTO users (user_id, preferences, interaction_count, last_interaction) \
             VALUES (?, '{}', 1, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 interaction_count = interaction_count + 1, \
                 last_interaction = excluded.last_interaction",
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_interactions (user_id, content_id, interaction_type, timestamp) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(content_id)
        .bind(kind.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let counter_sql = match kind {
            FeedbackKind::Like => "UPDATE content SET likes = likes + 1 WHERE id = ?",
            FeedbackKind::Dislike => "UPDATE content SET dislikes = dislikes + 1 WHERE id = ?",
        };
        sqlx::query(counter_sql)
            .bind(content_id)
            .execute(&mut *tx)
            .await?;

        // The increment and the recompute both stay in SQL inside this
        // transaction, so concurrent feedback on the same id cannot lose
        // updates. A row with no votes keeps its seeded rating.
        sqlx::query(
            "UPDATE content SET rating = CASE \
                 WHEN (likes + dislikes) > 0 THEN (likes * 10.0) / (likes + dislikes) \
                 ELSE rating \
             END \
             WHERE id = ?",
        )
        .bind(content_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {} FROM content WHERE id = ?", CONTENT_COLUMNS);
        let row: ContentRow = sqlx::query_as(&sql)
            .bind(content_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into_domain())
    }
}
