//! Vote registration: turns cast and removal requests into the smallest
//! ledger mutation, then refreshes the votable's cached summary.
use crate::db::{Database, Ledger};
use crate::error::Result;
use crate::models::{Scope, SlotKey, VotableKey, Vote, VoterKey};
use crate::voting::summary;
use crate::voting::words::{VoteValue, truthy};
use log::{debug, info};

pub const DEFAULT_WEIGHT: i64 = 1;

#[derive(Debug, Clone)]
pub struct CastRequest {
    pub voter: VoterKey,
    pub votable: VotableKey,
    pub scope: Scope,
    pub vote: VoteValue,
    pub weight: i64,
    /// Always insert a fresh row, skipping the one-row-per-slot rule.
    pub duplicate: bool,
}

impl CastRequest {
    pub fn new(voter: VoterKey, votable: VotableKey) -> Self {
        Self {
            voter,
            votable,
            scope: Scope::default(),
            vote: VoteValue::default(),
            weight: DEFAULT_WEIGHT,
            duplicate: false,
        }
    }

    pub fn slot(&self) -> SlotKey {
        SlotKey {
            voter: self.voter.0.clone(),
            votable: self.votable.entity.clone(),
            scope: self.scope.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoveRequest {
    pub voter: VoterKey,
    pub votable: VotableKey,
    pub scope: Scope,
}

impl RemoveRequest {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            voter: self.voter.0.clone(),
            votable: self.votable.entity.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Casts a vote. Returns whether the ledger changed (the vote "registered").
pub async fn handle_cast(database: &Database, request: &CastRequest) -> Result<bool> {
    let flag = truthy(&request.vote)?;
    let slot = request.slot();

    let mut tx = database.begin().await?;

    let registered = {
        let mut ledger = Ledger::new(&mut tx);

        if request.duplicate {
            ledger.insert(&Vote::new(&slot, flag, request.weight)).await?;
            true
        } else {
            match ledger.find(&slot).await? {
                None => {
                    ledger.insert(&Vote::new(&slot, flag, request.weight)).await?;
                    true
                }
                Some(existing) if existing.flag != flag || existing.weight != request.weight => {
                    ledger.update(&existing.id, flag, request.weight).await?;
                    true
                }
                Some(_) => false,
            }
        }
    };

    if !registered {
        // Nothing changed; dropping the transaction rolls back the read
        debug!(
            "Vote by {} on {} ({}) unchanged",
            slot.voter, slot.votable, slot.scope
        );
        return Ok(false);
    }

    if request.votable.cached {
        summary::recompute(&mut tx, &slot.votable, &slot.scope).await?;
    }

    tx.commit().await?;

    info!(
        "Registered {} vote (weight {}) by {} on {} in scope {}",
        if flag { "up" } else { "down" },
        request.weight,
        slot.voter,
        slot.votable,
        slot.scope
    );
    Ok(true)
}

/// Removes a vote. Every row in the slot goes, so duplicate-mode casts are
/// cleared too. Returns whether anything was deleted.
pub async fn handle_remove(database: &Database, request: &RemoveRequest) -> Result<bool> {
    let slot = request.slot();

    let mut tx = database.begin().await?;

    let deleted = Ledger::new(&mut tx).delete_all(&slot).await?;

    if deleted == 0 {
        debug!("No vote by {} on {} ({}) to remove", slot.voter, slot.votable, slot.scope);
        return Ok(false);
    }

    if request.votable.cached {
        summary::recompute(&mut tx, &slot.votable, &slot.scope).await?;
    }

    tx.commit().await?;

    info!(
        "Removed {} vote(s) by {} on {} in scope {}",
        deleted, slot.voter, slot.votable, slot.scope
    );
    Ok(true)
}
