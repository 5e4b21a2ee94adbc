use super::{Ballots, CastOptions, ReadOptions};
use crate::db::{Ledger, VoteFilter, cache};
use crate::error::Result;
use crate::handlers::{CastRequest, RemoveRequest, handle_cast, handle_remove};
use crate::models::{Scope, VotableKey, Vote, VoterKey};
use crate::resolve::EntityLoader;
use crate::voting::{Summary, SummaryCache, summary};

/// Ballot operations from the votable's side.
pub struct VotableBallots<'a> {
    ballots: &'a Ballots,
    key: VotableKey,
}

impl<'a> VotableBallots<'a> {
    pub(super) fn new(ballots: &'a Ballots, key: VotableKey) -> Self {
        Self { ballots, key }
    }

    pub fn key(&self) -> &VotableKey {
        &self.key
    }

    pub async fn vote_by(&self, voter: &VoterKey, options: CastOptions) -> Result<bool> {
        let request = CastRequest {
            voter: voter.clone(),
            votable: self.key.clone(),
            scope: options.scope,
            vote: options.vote,
            weight: options.weight,
            duplicate: options.duplicate,
        };
        handle_cast(&self.ballots.database, &request).await
    }

    pub async fn upvote_by(&self, voter: &VoterKey, scope: impl Into<Scope>) -> Result<bool> {
        self.vote_by(voter, CastOptions::up().scope(scope)).await
    }

    pub async fn downvote_by(&self, voter: &VoterKey, scope: impl Into<Scope>) -> Result<bool> {
        self.vote_by(voter, CastOptions::down().scope(scope)).await
    }

    pub async fn unvote_by(&self, voter: &VoterKey, scope: impl Into<Scope>) -> Result<bool> {
        let request = RemoveRequest {
            voter: voter.clone(),
            votable: self.key.clone(),
            scope: scope.into(),
        };
        handle_remove(&self.ballots.database, &request).await
    }

    pub async fn votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let mut conn = self.ballots.database.acquire().await?;
        Ledger::new(&mut conn)
            .list_for_votable(&self.key.entity, filter)
            .await
    }

    pub async fn up_votes(&self, scope: impl Into<Scope>) -> Result<Vec<Vote>> {
        self.votes(&VoteFilter::scope(scope).up()).await
    }

    pub async fn down_votes(&self, scope: impl Into<Scope>) -> Result<Vec<Vote>> {
        self.votes(&VoteFilter::scope(scope).down()).await
    }

    pub async fn voted_on_by(&self, voter: &VoterKey, filter: &VoteFilter) -> Result<bool> {
        let mut conn = self.ballots.database.acquire().await?;
        Ledger::new(&mut conn)
            .exists(&voter.0, &self.key.entity, filter)
            .await
    }

    /// Distinct voters, in the order they first voted.
    pub async fn voters(&self, filter: &VoteFilter) -> Result<Vec<VoterKey>> {
        let mut conn = self.ballots.database.acquire().await?;
        let keys = Ledger::new(&mut conn)
            .voters_of(&self.key.entity, filter)
            .await?;
        Ok(keys.into_iter().map(VoterKey).collect())
    }

    /// Distinct voters, eagerly loaded through the host's loader.
    pub async fn load_voters<L: EntityLoader>(
        &self,
        loader: &L,
        filter: &VoteFilter,
    ) -> Result<Vec<L::Entity>> {
        let keys: Vec<_> = self
            .voters(filter)
            .await?
            .into_iter()
            .map(|voter| voter.0)
            .collect();
        loader.load(&keys).await
    }

    pub async fn summary(&self, options: &ReadOptions) -> Result<Summary> {
        let mut conn = self.ballots.database.acquire().await?;
        summary::read(&mut conn, &self.key, &options.scope, options.skip_cache).await
    }

    pub async fn total(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.total)
    }

    pub async fn up(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.up)
    }

    pub async fn down(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.down)
    }

    pub async fn score(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.score)
    }

    pub async fn weighted_total(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.weighted_total)
    }

    pub async fn weighted_score(&self, options: &ReadOptions) -> Result<i64> {
        Ok(self.summary(options).await?.weighted_score)
    }

    pub async fn weighted_average(&self, options: &ReadOptions) -> Result<f64> {
        Ok(self.summary(options).await?.weighted_average)
    }

    /// The whole per-scope cache blob, or `None` for votables without one.
    pub async fn cached_summary(&self) -> Result<Option<SummaryCache>> {
        if !self.key.cached {
            return Ok(None);
        }

        let mut conn = self.ballots.database.acquire().await?;
        Ok(Some(cache::load_cache(&mut conn, &self.key.entity).await?))
    }
}
