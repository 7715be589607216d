use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use uuid::Uuid;

use shared::domain::OrderId;

/// On-device store for board state that never reaches the remote backend.
///
/// Today that is a single concern: the set of order ids the viewer has
/// archived away, keyed by a scope identifier so two identities on the same
/// machine do not see each other's archive.
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

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_archived_orders(&self, scope: &str) -> Result<HashSet<OrderId>> {
        let rows = sqlx::query(
            "SELECT order_id FROM archived_orders WHERE scope = ? ORDER BY archived_at ASC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.get(0);
            let id = Uuid::parse_str(&raw)
                .with_context(|| format!("invalid archived order id '{raw}' in scope '{scope}'"))?;
            ids.insert(OrderId(id));
        }
        Ok(ids)
    }

    /// Replaces the stored set for a scope with `ids`, atomically. Called on
    /// every archive toggle so the on-disk content always equals the board's
    /// in-memory set.
    pub async fn save_archived_orders(&self, scope: &str, ids: &HashSet<OrderId>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM archived_orders WHERE scope = ?")
            .bind(scope)
            .execute(&mut *tx)
            .await?;

        for id in ids {
            sqlx::query("INSERT INTO archived_orders (scope, order_id) VALUES (?, ?)")
                .bind(scope)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
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
