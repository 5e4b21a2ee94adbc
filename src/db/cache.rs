use crate::error::Result;
use crate::models::EntityKey;
use crate::voting::SummaryCache;
use log::debug;
use sqlx::{Row, SqliteConnection};

/// Creates the empty `{}` cache blob for a votable; existing blobs are kept.
pub async fn init_cache(conn: &mut SqliteConnection, votable: &EntityKey) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ballot_summaries (votable_type, votable_id, cached_ballot_summary)
        VALUES (?, ?, '{}')
        ON CONFLICT(votable_type, votable_id) DO NOTHING
        "#,
    )
    .bind(&votable.kind)
    .bind(&votable.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Whether the votable has a cache blob at all. Only cached kinds get one.
pub async fn cache_exists(conn: &mut SqliteConnection, votable: &EntityKey) -> Result<bool> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM ballot_summaries WHERE votable_type = ? AND votable_id = ?
        ) AS found
        "#,
    )
    .bind(&votable.kind)
    .bind(&votable.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.try_get::<bool, _>("found")?)
}

/// Reads the cache blob. A votable whose blob was never written reads as empty.
pub async fn load_cache(conn: &mut SqliteConnection, votable: &EntityKey) -> Result<SummaryCache> {
    let row = sqlx::query(
        r#"
        SELECT cached_ballot_summary
        FROM ballot_summaries
        WHERE votable_type = ? AND votable_id = ?
        "#,
    )
    .bind(&votable.kind)
    .bind(&votable.id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let raw: String = row.try_get("cached_ballot_summary")?;
            Ok(SummaryCache::from_json(&raw)?)
        }
        None => Ok(SummaryCache::default()),
    }
}

pub async fn store_cache(
    conn: &mut SqliteConnection,
    votable: &EntityKey,
    cache: &SummaryCache,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ballot_summaries (votable_type, votable_id, cached_ballot_summary)
        VALUES (?, ?, ?)
        ON CONFLICT(votable_type, votable_id)
        DO UPDATE SET cached_ballot_summary = excluded.cached_ballot_summary
        "#,
    )
    .bind(&votable.kind)
    .bind(&votable.id)
    .bind(cache.to_json()?)
    .execute(&mut *conn)
    .await?;

    debug!("Stored ballot summary cache for {}", votable);
    Ok(())
}
