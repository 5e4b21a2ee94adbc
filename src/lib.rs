//! # trusty-ballot
//!
//! Scoped up/down voting between arbitrary entities, stored in SQLite.
//!
//! Any type can become a [`Voter`] or a [`Votable`] by implementing the
//! matching trait. Each vote lives in a ledger row keyed by voter, votable and
//! an optional scope label, carrying a direction and an integer weight.
//! Votables may opt into a per-scope summary cache that is recomputed inside
//! the same transaction as every registered vote.
//!
//! ```no_run
//! use trusty_ballot::{
//!     Ballots, CastOptions, Database, Entity, ReadOptions, Registry, Votable, VotableKey, Voter,
//! };
//!
//! struct User(u64);
//! struct Post(u64);
//!
//! impl Entity for User {
//!     const KIND: &'static str = "User";
//!     fn entity_id(&self) -> String { self.0.to_string() }
//! }
//! impl Voter for User {}
//!
//! impl Entity for Post {
//!     const KIND: &'static str = "Post";
//!     fn entity_id(&self) -> String { self.0.to_string() }
//! }
//! impl Votable for Post {
//!     const SUMMARY_CACHE: bool = true;
//! }
//!
//! # async fn run() -> trusty_ballot::Result<()> {
//! let registry = Registry::new().voter::<User>().votable::<Post>();
//! let ballots = Ballots::new(Database::in_memory().await?, registry);
//!
//! let post = Post(1);
//! ballots.register_votable(&post).await?;
//! ballots
//!     .voter(&User(7))
//!     .vote(&VotableKey::of(&post), CastOptions::up().weight(4))
//!     .await?;
//!
//! let summary = ballots.votable(&post).summary(&ReadOptions::default()).await?;
//! assert_eq!(summary.weighted_total, 4);
//! # Ok(())
//! # }
//! ```
pub mod ballots;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod resolve;
pub mod voting;

pub use ballots::{Ballots, CastOptions, ReadOptions, VotableBallots, VoterBallots};
pub use config::Config;
pub use db::{Database, VoteFilter};
pub use error::{BallotError, Result};
pub use models::{Entity, EntityKey, Scope, Votable, VotableKey, Vote, Voter, VoterKey};
pub use resolve::{EntityLoader, EntityRef, EntityResolver, GlobalIdResolver, Registry};
pub use voting::words::{VoteValue, truthy};
pub use voting::{Summary, SummaryCache};
