use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{Cast, CastId, CastVersion, NewCast, PromptEntry};

pub mod assets;

pub use assets::AssetStore;

/// Entries kept in each dashboard panel.
pub const PANEL_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn fetch_cast(&self, cast_id: CastId) -> Result<Option<Cast>> {
        let row = sqlx::query(
            "SELECT c.id, c.name, c.farcaster_id, c.image_path, c.parent_id, c.layer_1_cast_id,
                    c.branch_num, c.num_derivatives, c.num_total_derivatives, c.prompt_input,
                    c.locked, c.created_at, COALESCE(root.locked, 0)
             FROM casts c
             LEFT JOIN casts root ON root.id = c.layer_1_cast_id
             WHERE c.id = ?",
        )
        .bind(cast_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load cast {cast_id}"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut cast = cast_from_row(&row);
        cast.latest_prompts = self.latest_prompts(cast_id, PANEL_LIMIT).await?;
        cast.version_history = self.version_history(cast_id, PANEL_LIMIT).await?;
        Ok(Some(cast))
    }

    /// Prompts used to remix `cast_id`, newest first.
    pub async fn latest_prompts(&self, cast_id: CastId, limit: u32) -> Result<Vec<PromptEntry>> {
        let rows = sqlx::query(
            "SELECT id, prompt_input, created_at
             FROM casts
             WHERE parent_id = ? AND prompt_input IS NOT NULL
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(cast_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list prompts for cast {cast_id}"))?;

        Ok(rows
            .into_iter()
            .map(|r| PromptEntry {
                cast_id: CastId(r.get::<i64, _>(0)),
                prompt_input: r.get::<String, _>(1),
                created_at: r.get::<DateTime<Utc>, _>(2),
            })
            .collect())
    }

    /// Direct derivatives of `cast_id`, newest first.
    pub async fn version_history(&self, cast_id: CastId, limit: u32) -> Result<Vec<CastVersion>> {
        let rows = sqlx::query(
            "SELECT id, name, image_path, branch_num, created_at
             FROM casts
             WHERE parent_id = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(cast_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list versions for cast {cast_id}"))?;

        Ok(rows
            .into_iter()
            .map(|r| CastVersion {
                cast_id: CastId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
                image_path: r.get::<Option<String>, _>(2),
                branch_num: to_u32(r.get::<i64, _>(3)),
                created_at: r.get::<DateTime<Utc>, _>(4),
            })
            .collect())
    }

    /// Inserts a cast and bumps the derivative counters of its ancestors.
    pub async fn store_cast(&self, cast: &NewCast) -> Result<CastId> {
        let mut tx = self.pool.begin().await?;

        let rec = sqlx::query(
            "INSERT INTO casts (name, farcaster_id, image_path, parent_id, branch_num, prompt_input, layer_1_cast_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&cast.name)
        .bind(&cast.farcaster_id)
        .bind(cast.image_path.as_deref())
        .bind(cast.parent_id.map(|id| id.0))
        .bind(i64::from(cast.branch_num))
        .bind(cast.prompt_input.as_deref())
        .bind(cast.layer_1_cast_id.map(|id| id.0))
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert cast")?;
        let cast_id = CastId(rec.get::<i64, _>(0));

        if let Some(parent_id) = cast.parent_id {
            sqlx::query("UPDATE casts SET num_derivatives = num_derivatives + 1 WHERE id = ?")
                .bind(parent_id.0)
                .execute(&mut *tx)
                .await
                .context("failed to count direct derivative")?;

            sqlx::query(
                "WITH RECURSIVE ancestors(id) AS (
                     SELECT ?
                     UNION ALL
                     SELECT c.parent_id FROM casts c
                     INNER JOIN ancestors a ON c.id = a.id
                     WHERE c.parent_id IS NOT NULL
                 )
                 UPDATE casts
                 SET num_total_derivatives = num_total_derivatives + 1
                 WHERE id IN (SELECT id FROM ancestors)",
            )
            .bind(parent_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to count lineage derivative")?;
        }

        tx.commit().await?;
        debug!(cast_id = cast_id.0, branch_num = cast.branch_num, "stored cast");
        Ok(cast_id)
    }

    pub async fn lock_layer(&self, cast_id: CastId) -> Result<()> {
        sqlx::query("UPDATE casts SET locked = 1 WHERE id = ?")
            .bind(cast_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to lock cast {cast_id}"))?;
        Ok(())
    }

    /// Records the finished image of a cast. Returns `false` when the cast
    /// does not exist.
    pub async fn set_image_path(&self, cast_id: CastId, image_path: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE casts SET image_path = ? WHERE id = ?")
            .bind(image_path)
            .bind(cast_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to set image for cast {cast_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn cast_from_row(r: &SqliteRow) -> Cast {
    Cast {
        id: CastId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        farcaster_id: r.get::<String, _>(2),
        image_path: r.get::<Option<String>, _>(3),
        parent_id: r.get::<Option<i64>, _>(4).map(CastId),
        layer_1_cast_id: r.get::<Option<i64>, _>(5).map(CastId),
        branch_num: to_u32(r.get::<i64, _>(6)),
        num_derivatives: r.get::<i64, _>(7).max(0) as u64,
        num_total_derivatives: r.get::<i64, _>(8).max(0) as u64,
        prompt_input: r.get::<Option<String>, _>(9),
        locked: r.get::<bool, _>(10) || r.get::<bool, _>(12),
        created_at: r.get::<DateTime<Utc>, _>(11),
        latest_prompts: Vec::new(),
        version_history: Vec::new(),
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
