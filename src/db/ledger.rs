//! Ledger store: keyed lookups, mutations and aggregates over the `votes`
//! table.
//!
//! A [`Ledger`] borrows a single connection, which may be a plain pooled
//! connection or an open transaction. The registration engine hands it a
//! transaction so that lookup, mutation and cache recompute commit together.
use crate::error::{BallotError, Result};
use crate::models::{EntityKey, Scope, SlotKey, Vote};
use crate::voting::Tally;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

const VOTE_COLUMNS: &str = "SELECT id, votable_type, votable_id, voter_type, voter_id, \
    vote_flag, vote_scope, vote_weight, created_at, updated_at FROM votes";

/// Row filter for listing queries. The scope always applies; listings never
/// span scopes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteFilter {
    pub scope: Scope,
    /// `Some(true)` for up votes only, `Some(false)` for down votes only.
    pub direction: Option<bool>,
}

impl VoteFilter {
    pub fn scope(scope: impl Into<Scope>) -> Self {
        Self {
            scope: scope.into(),
            direction: None,
        }
    }

    pub fn up(mut self) -> Self {
        self.direction = Some(true);
        self
    }

    pub fn down(mut self) -> Self {
        self.direction = Some(false);
        self
    }

    pub fn direction(mut self, direction: Option<bool>) -> Self {
        self.direction = direction;
        self
    }
}

pub struct Ledger<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// The earliest row in the slot, if any.
    pub async fn find(&mut self, slot: &SlotKey) -> Result<Option<Vote>> {
        let mut builder = QueryBuilder::<Sqlite>::new(VOTE_COLUMNS);
        push_slot(&mut builder, slot);
        builder.push(" ORDER BY rowid LIMIT 1");

        let row = builder.build().fetch_optional(&mut *self.conn).await?;
        row.as_ref().map(vote_from_row).transpose()
    }

    /// Every row in the slot; more than one only after duplicate-mode casts.
    pub async fn find_all(&mut self, slot: &SlotKey) -> Result<Vec<Vote>> {
        let mut builder = QueryBuilder::<Sqlite>::new(VOTE_COLUMNS);
        push_slot(&mut builder, slot);
        builder.push(" ORDER BY rowid");

        let rows = builder.build().fetch_all(&mut *self.conn).await?;
        rows.iter().map(vote_from_row).collect()
    }

    pub async fn insert(&mut self, vote: &Vote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO votes (id, votable_type, votable_id, voter_type, voter_id,
                vote_flag, vote_scope, vote_weight, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vote.id)
        .bind(&vote.votable.kind)
        .bind(&vote.votable.id)
        .bind(&vote.voter.kind)
        .bind(&vote.voter.id)
        .bind(vote.flag)
        .bind(vote.scope.as_deref())
        .bind(vote.weight)
        .bind(vote.created_at.to_rfc3339())
        .bind(vote.updated_at.to_rfc3339())
        .execute(&mut *self.conn)
        .await?;

        debug!("Inserted vote {} by {} on {}", vote.id, vote.voter, vote.votable);
        Ok(())
    }

    pub async fn update(&mut self, id: &str, flag: bool, weight: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE votes
            SET vote_flag = ?, vote_weight = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(flag)
        .bind(weight)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BallotError::NotFound(id.to_string()));
        }

        debug!("Updated vote {} to flag={} weight={}", id, flag, weight);
        Ok(())
    }

    /// Deletes every row in the slot, duplicates included. Returns the
    /// number of rows removed.
    pub async fn delete_all(&mut self, slot: &SlotKey) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM votes");
        push_slot(&mut builder, slot);

        let result = builder.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    /// Count, weight sum and signed weight sum of a votable's rows in one
    /// scope, optionally restricted to one direction. SQLite raises an
    /// integer overflow error instead of wrapping.
    pub async fn aggregate(
        &mut self,
        votable: &EntityKey,
        scope: &Scope,
        direction: Option<bool>,
    ) -> Result<Tally> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*) AS count,
                COALESCE(SUM(vote_weight), 0) AS weight_sum,
                COALESCE(SUM(CASE WHEN vote_flag THEN vote_weight ELSE -vote_weight END), 0)
                    AS signed_weight_sum
            FROM votes
            "#,
        );
        push_votable(&mut builder, votable, scope);
        push_direction(&mut builder, direction);

        let row = builder.build().fetch_one(&mut *self.conn).await?;
        Ok(Tally {
            count: row.try_get("count")?,
            weight_sum: row.try_get("weight_sum")?,
            signed_weight_sum: row.try_get("signed_weight_sum")?,
        })
    }

    pub async fn list_for_votable(
        &mut self,
        votable: &EntityKey,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>> {
        let mut builder = QueryBuilder::<Sqlite>::new(VOTE_COLUMNS);
        push_votable(&mut builder, votable, &filter.scope);
        push_direction(&mut builder, filter.direction);
        builder.push(" ORDER BY rowid");

        let rows = builder.build().fetch_all(&mut *self.conn).await?;
        rows.iter().map(vote_from_row).collect()
    }

    pub async fn list_for_voter(
        &mut self,
        voter: &EntityKey,
        filter: &VoteFilter,
    ) -> Result<Vec<Vote>> {
        let mut builder = QueryBuilder::<Sqlite>::new(VOTE_COLUMNS);
        push_voter(&mut builder, voter, &filter.scope);
        push_direction(&mut builder, filter.direction);
        builder.push(" ORDER BY rowid");

        let rows = builder.build().fetch_all(&mut *self.conn).await?;
        rows.iter().map(vote_from_row).collect()
    }

    /// Whether the voter holds at least one matching row on the votable.
    pub async fn exists(
        &mut self,
        voter: &EntityKey,
        votable: &EntityKey,
        filter: &VoteFilter,
    ) -> Result<bool> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT EXISTS (SELECT 1 FROM votes");
        push_slot(
            &mut builder,
            &SlotKey {
                voter: voter.clone(),
                votable: votable.clone(),
                scope: filter.scope.clone(),
            },
        );
        push_direction(&mut builder, filter.direction);
        builder.push(") AS found");

        let row = builder.build().fetch_one(&mut *self.conn).await?;
        Ok(row.try_get::<bool, _>("found")?)
    }

    /// Distinct voters on a votable, in first-vote order.
    pub async fn voters_of(
        &mut self,
        votable: &EntityKey,
        filter: &VoteFilter,
    ) -> Result<Vec<EntityKey>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT voter_type AS kind, voter_id AS id FROM votes");
        push_votable(&mut builder, votable, &filter.scope);
        push_direction(&mut builder, filter.direction);
        builder.push(" GROUP BY voter_type, voter_id ORDER BY MIN(rowid)");

        let rows = builder.build().fetch_all(&mut *self.conn).await?;
        rows.iter().map(key_from_row).collect()
    }

    /// Distinct votables of one kind the voter voted on, in first-vote order.
    pub async fn votables_of_kind(
        &mut self,
        voter: &EntityKey,
        kind: &str,
        filter: &VoteFilter,
    ) -> Result<Vec<EntityKey>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT votable_type AS kind, votable_id AS id FROM votes",
        );
        push_voter(&mut builder, voter, &filter.scope);
        builder.push(" AND votable_type = ").push_bind(kind.to_string());
        push_direction(&mut builder, filter.direction);
        builder.push(" GROUP BY votable_type, votable_id ORDER BY MIN(rowid)");

        let rows = builder.build().fetch_all(&mut *self.conn).await?;
        rows.iter().map(key_from_row).collect()
    }
}

fn push_slot(builder: &mut QueryBuilder<'_, Sqlite>, slot: &SlotKey) {
    builder
        .push(" WHERE voter_type = ")
        .push_bind(slot.voter.kind.clone())
        .push(" AND voter_id = ")
        .push_bind(slot.voter.id.clone())
        .push(" AND votable_type = ")
        .push_bind(slot.votable.kind.clone())
        .push(" AND votable_id = ")
        .push_bind(slot.votable.id.clone());
    push_scope(builder, &slot.scope);
}

fn push_votable(builder: &mut QueryBuilder<'_, Sqlite>, votable: &EntityKey, scope: &Scope) {
    builder
        .push(" WHERE votable_type = ")
        .push_bind(votable.kind.clone())
        .push(" AND votable_id = ")
        .push_bind(votable.id.clone());
    push_scope(builder, scope);
}

fn push_voter(builder: &mut QueryBuilder<'_, Sqlite>, voter: &EntityKey, scope: &Scope) {
    builder
        .push(" WHERE voter_type = ")
        .push_bind(voter.kind.clone())
        .push(" AND voter_id = ")
        .push_bind(voter.id.clone());
    push_scope(builder, scope);
}

fn push_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: &Scope) {
    // `IS` matches NULL against NULL, so the default scope needs no special case
    builder
        .push(" AND vote_scope IS ")
        .push_bind(scope.label().map(str::to_string));
}

fn push_direction(builder: &mut QueryBuilder<'_, Sqlite>, direction: Option<bool>) {
    if let Some(flag) = direction {
        builder.push(" AND vote_flag = ").push_bind(flag);
    }
}

fn key_from_row(row: &SqliteRow) -> Result<EntityKey> {
    Ok(EntityKey::new(
        row.try_get::<String, _>("kind")?,
        row.try_get::<String, _>("id")?,
    ))
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote> {
    Ok(Vote {
        id: row.try_get("id")?,
        votable: EntityKey::new(
            row.try_get::<String, _>("votable_type")?,
            row.try_get::<String, _>("votable_id")?,
        ),
        voter: EntityKey::new(
            row.try_get::<String, _>("voter_type")?,
            row.try_get::<String, _>("voter_id")?,
        ),
        flag: row.try_get("vote_flag")?,
        scope: row.try_get("vote_scope")?,
        weight: row.try_get("vote_weight")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, "created_at")?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?, "updated_at")?,
    })
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BallotError::InvalidRecord(format!("Failed to parse {}: {}", column, e)))
}
