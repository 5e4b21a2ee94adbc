//! Summary calculator: live aggregates from the ledger, and the per-scope
//! cache that mirrors them.
use crate::db::{Ledger, cache};
use crate::error::Result;
use crate::models::{EntityKey, Scope, VotableKey};
use crate::voting::Summary;
use log::debug;
use sqlx::SqliteConnection;

/// Computes a scope's summary straight from the ledger.
pub async fn compute(
    conn: &mut SqliteConnection,
    votable: &EntityKey,
    scope: &Scope,
) -> Result<Summary> {
    let mut ledger = Ledger::new(conn);

    let all = ledger.aggregate(votable, scope, None).await?;
    let up = ledger.aggregate(votable, scope, Some(true)).await?;
    let down = ledger.aggregate(votable, scope, Some(false)).await?;

    Ok(Summary::from_tallies(all, up, down))
}

/// Recomputes one scope and replaces only that entry of the votable's cache.
///
/// Must run on the same connection (transaction) as the ledger mutation it
/// follows, so the cache never commits without the rows it describes.
pub async fn recompute(
    conn: &mut SqliteConnection,
    votable: &EntityKey,
    scope: &Scope,
) -> Result<Summary> {
    let summary = compute(conn, votable, scope).await?;

    let mut cached = cache::load_cache(conn, votable).await?;
    cached.replace(scope.cache_key(), summary);
    cache::store_cache(conn, votable, &cached).await?;

    debug!(
        "Recomputed {} summary for {}: total={} score={}",
        scope, votable, summary.total, summary.score
    );
    Ok(summary)
}

/// Read path. Serves from the cache when the votable keeps one and the caller
/// did not ask to skip it; never writes.
pub async fn read(
    conn: &mut SqliteConnection,
    votable: &VotableKey,
    scope: &Scope,
    skip_cache: bool,
) -> Result<Summary> {
    if votable.cached && !skip_cache {
        let cached = cache::load_cache(conn, &votable.entity).await?;
        // A scope that never received a vote has no entry yet
        return Ok(cached.get(scope.cache_key()).copied().unwrap_or_default());
    }

    compute(conn, &votable.entity, scope).await
}
