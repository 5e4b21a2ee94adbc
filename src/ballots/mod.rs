//! Per-entity convenience surface over the ledger.
//!
//! [`Ballots`] is the entry point the host model layer holds on to. Typed
//! entities go through [`Ballots::voter`] / [`Ballots::votable`] and need no
//! runtime checks; loose references go through the `resolve_*` methods and are
//! validated against the [`Registry`].
mod votable;
mod voter;

pub use votable::VotableBallots;
pub use voter::VoterBallots;

use crate::config::Config;
use crate::db::{Database, cache};
use crate::error::Result;
use crate::handlers::DEFAULT_WEIGHT;
use crate::models::{Scope, Votable, VotableKey, Voter, VoterKey};
use crate::resolve::{EntityRef, EntityResolver, GlobalIdResolver, Registry};
use crate::voting::words::VoteValue;
use crate::voting::{Summary, summary};
use log::info;
use std::sync::Arc;

/// How a vote should be cast.
#[derive(Debug, Clone)]
pub struct CastOptions {
    pub vote: VoteValue,
    pub scope: Scope,
    pub weight: i64,
    pub duplicate: bool,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            vote: VoteValue::default(),
            scope: Scope::default(),
            weight: DEFAULT_WEIGHT,
            duplicate: false,
        }
    }
}

impl CastOptions {
    pub fn vote(value: impl Into<VoteValue>) -> Self {
        Self {
            vote: value.into(),
            ..Self::default()
        }
    }

    pub fn up() -> Self {
        Self::vote(true)
    }

    pub fn down() -> Self {
        Self::vote(false)
    }

    pub fn scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }
}

/// How a summary should be read.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub scope: Scope,
    pub skip_cache: bool,
}

impl ReadOptions {
    pub fn scope(scope: impl Into<Scope>) -> Self {
        Self {
            scope: scope.into(),
            skip_cache: false,
        }
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }
}

#[derive(Clone)]
pub struct Ballots {
    database: Database,
    registry: Arc<Registry>,
    resolver: Arc<dyn EntityResolver>,
}

impl Ballots {
    pub fn new(database: Database, registry: Registry) -> Self {
        Self {
            database,
            registry: Arc::new(registry),
            resolver: Arc::new(GlobalIdResolver::default()),
        }
    }

    pub async fn from_config(config: &Config, registry: Registry) -> Result<Self> {
        let database = Database::new(config).await?;
        Ok(Self::new(database, registry)
            .with_resolver(GlobalIdResolver::new(config.global_id_app.clone())))
    }

    pub fn with_resolver(mut self, resolver: impl EntityResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn voter<T: Voter>(&self, voter: &T) -> VoterBallots<'_> {
        VoterBallots::new(self, VoterKey::of(voter))
    }

    pub fn votable<T: Votable>(&self, votable: &T) -> VotableBallots<'_> {
        VotableBallots::new(self, VotableKey::of(votable))
    }

    pub async fn resolve_voter(&self, reference: &EntityRef) -> Result<VoterBallots<'_>> {
        let key = self.resolver.resolve(reference).await?;
        let key = self.registry.voter_key(key)?;
        Ok(VoterBallots::new(self, key))
    }

    pub async fn resolve_votable(&self, reference: &EntityRef) -> Result<VotableBallots<'_>> {
        let key = self.resolver.resolve(reference).await?;
        let key = self.registry.votable_key(key)?;
        Ok(VotableBallots::new(self, key))
    }

    /// Casts a vote between two loosely referenced entities.
    pub async fn cast(
        &self,
        voter: &EntityRef,
        votable: &EntityRef,
        options: CastOptions,
    ) -> Result<bool> {
        let votable = self.resolve_votable(votable).await?.key().clone();
        self.resolve_voter(voter).await?.vote(&votable, options).await
    }

    /// Removes a vote between two loosely referenced entities.
    pub async fn remove(
        &self,
        voter: &EntityRef,
        votable: &EntityRef,
        scope: impl Into<Scope>,
    ) -> Result<bool> {
        let votable = self.resolve_votable(votable).await?.key().clone();
        self.resolve_voter(voter).await?.unvote(&votable, scope).await
    }

    /// Initializes the empty summary cache of a newly created votable.
    pub async fn register_votable<T: Votable>(&self, votable: &T) -> Result<()> {
        let key = VotableKey::of(votable);
        if !key.cached {
            return Ok(());
        }

        let mut conn = self.database.acquire().await?;
        cache::init_cache(&mut conn, &key.entity).await
    }

    /// Rebuilds one scope of a votable's summary from the ledger, storing it
    /// when the votable keeps a cache.
    pub async fn refresh_summary(&self, votable: &VotableKey, scope: &Scope) -> Result<Summary> {
        let mut tx = self.database.begin().await?;

        let summary = if votable.cached {
            summary::recompute(&mut tx, &votable.entity, scope).await?
        } else {
            summary::compute(&mut tx, &votable.entity, scope).await?
        };

        tx.commit().await?;
        info!("Refreshed {} summary for {}", scope, votable.entity);
        Ok(summary)
    }
}
