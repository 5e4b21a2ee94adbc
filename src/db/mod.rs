pub mod cache;
pub mod ledger;

pub use ledger::{Ledger, VoteFilter};

use crate::config::Config;
use crate::error::Result;
use log::{debug, info};
use sqlx::{
    Sqlite, Transaction,
    migrate::MigrateDatabase,
    pool::PoolConnection,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        if config.is_in_memory() {
            return Self::in_memory().await;
        }

        // Create database if it doesn't exist
        if !Sqlite::database_exists(&config.database_url).await.unwrap_or(false) {
            info!("Creating database at {}", config.database_url);
            Sqlite::create_database(&config.database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// A private in-memory database. Pinned to one connection that never
    /// expires, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub(crate) async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        debug!("Bootstrapping ballot schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                votable_type TEXT NOT NULL,
                votable_id TEXT NOT NULL,
                voter_type TEXT NOT NULL,
                voter_id TEXT NOT NULL,
                vote_flag BOOLEAN NOT NULL,
                vote_scope TEXT,
                vote_weight INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS index_votes_on_slot
                ON votes (voter_type, voter_id, votable_type, votable_id, vote_scope);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS index_votes_on_votable_scope
                ON votes (votable_type, votable_id, vote_scope, vote_flag);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ballot_summaries (
                votable_type TEXT NOT NULL,
                votable_id TEXT NOT NULL,
                cached_ballot_summary TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (votable_type, votable_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
