use super::{Ballots, CastOptions};
use crate::db::{Ledger, VoteFilter};
use crate::error::Result;
use crate::handlers::{CastRequest, RemoveRequest, handle_cast, handle_remove};
use crate::models::{EntityKey, Scope, SlotKey, VotableKey, Vote, VoterKey};

/// Ballot operations from the voter's side.
pub struct VoterBallots<'a> {
    ballots: &'a Ballots,
    key: VoterKey,
}

impl<'a> VoterBallots<'a> {
    pub(super) fn new(ballots: &'a Ballots, key: VoterKey) -> Self {
        Self { ballots, key }
    }

    pub fn key(&self) -> &VoterKey {
        &self.key
    }

    /// Returns whether the vote registered, i.e. changed the ledger.
    pub async fn vote(&self, votable: &VotableKey, options: CastOptions) -> Result<bool> {
        let request = CastRequest {
            voter: self.key.clone(),
            votable: votable.clone(),
            scope: options.scope,
            vote: options.vote,
            weight: options.weight,
            duplicate: options.duplicate,
        };
        handle_cast(&self.ballots.database, &request).await
    }

    pub async fn vote_up(&self, votable: &VotableKey, scope: impl Into<Scope>) -> Result<bool> {
        self.vote(votable, CastOptions::up().scope(scope)).await
    }

    pub async fn vote_down(&self, votable: &VotableKey, scope: impl Into<Scope>) -> Result<bool> {
        self.vote(votable, CastOptions::down().scope(scope)).await
    }

    /// Removes this voter's vote in the scope, duplicate rows included.
    pub async fn unvote(&self, votable: &VotableKey, scope: impl Into<Scope>) -> Result<bool> {
        let request = RemoveRequest {
            voter: self.key.clone(),
            votable: votable.clone(),
            scope: scope.into(),
        };
        handle_remove(&self.ballots.database, &request).await
    }

    pub async fn voted_for(&self, votable: &VotableKey, filter: &VoteFilter) -> Result<bool> {
        let mut conn = self.ballots.database.acquire().await?;
        Ledger::new(&mut conn)
            .exists(&self.key.0, &votable.entity, filter)
            .await
    }

    pub async fn voted_up_on(&self, votable: &VotableKey, scope: impl Into<Scope>) -> Result<bool> {
        self.voted_for(votable, &VoteFilter::scope(scope).up()).await
    }

    pub async fn voted_down_on(
        &self,
        votable: &VotableKey,
        scope: impl Into<Scope>,
    ) -> Result<bool> {
        self.voted_for(votable, &VoteFilter::scope(scope).down()).await
    }

    /// Direction of this voter's existing vote on the votable, if any.
    pub async fn voted_as(
        &self,
        votable: &VotableKey,
        scope: impl Into<Scope>,
    ) -> Result<Option<bool>> {
        let slot = SlotKey {
            voter: self.key.0.clone(),
            votable: votable.entity.clone(),
            scope: scope.into(),
        };

        let mut conn = self.ballots.database.acquire().await?;
        let existing = Ledger::new(&mut conn).find(&slot).await?;
        Ok(existing.map(|vote| vote.flag))
    }

    pub async fn votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let mut conn = self.ballots.database.acquire().await?;
        Ledger::new(&mut conn).list_for_voter(&self.key.0, filter).await
    }

    pub async fn up_votes(&self, scope: impl Into<Scope>) -> Result<Vec<Vote>> {
        self.votes(&VoteFilter::scope(scope).up()).await
    }

    pub async fn down_votes(&self, scope: impl Into<Scope>) -> Result<Vec<Vote>> {
        self.votes(&VoteFilter::scope(scope).down()).await
    }

    /// Keys of every entity of `kind` this voter voted on.
    pub async fn voted_kind(&self, kind: &str, filter: &VoteFilter) -> Result<Vec<EntityKey>> {
        let mut conn = self.ballots.database.acquire().await?;
        Ledger::new(&mut conn)
            .votables_of_kind(&self.key.0, kind, filter)
            .await
    }
}
