use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::KeyValueStore;
use crate::config::App;
use crate::error::KvError;

const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations_table.sql", include_str!("migrations/000_migrations_table.sql")),
    ("001_kv.sql", include_str!("migrations/001_kv.sql")),
];

/// Pin lists in a `kv` table. Runs against a local file, or as an embedded
/// replica of a Turso database when both `turso_url` and `turso_auth_token`
/// are set.
pub struct LibsqlStore {
    db: LibsqlDatabase,
    conn: Connection,
    replicated: bool,
}

impl LibsqlStore {
    pub async fn new(app: &App, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(app.get_db());

        let remote = match (&app.turso_url, &app.turso_auth_token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => Some((url, token)),
            _ => None,
        };

        let db = match remote {
            Some((url, token)) => {
                tracing::info!("[kv] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            None => {
                tracing::info!(path = %path.display(), "[kv] running against local database");
                Builder::new_local(&path).build().await?
            }
        };

        Self::setup(db, remote.is_some()).await
    }

    pub async fn open_local(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::setup(db, false).await
    }

    async fn setup(db: LibsqlDatabase, replicated: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (name, sql) in MIGRATIONS {
            Self::run_migration(&conn, name, sql).await?;
        }

        Ok(LibsqlStore {
            db,
            conn,
            replicated,
        })
    }

    /// Pushes local writes to the remote primary. No-op for local databases.
    pub async fn sync(&self) -> Result<()> {
        if self.replicated {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?1";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) if e.to_string().contains("no such table") => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        conn.execute(
            "INSERT INTO _migrations (name, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            libsql::params![name],
        )
        .await?;
        Ok(())
    }
}

impl KeyValueStore for LibsqlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv WHERE key = ?1", libsql::params![key])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), KvError> {
        let query = r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#;
        self.conn
            .execute(query, libsql::params![key, value])
            .await?;
        Ok(())
    }
}
