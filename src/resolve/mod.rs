//! Loose entity references and the capability registry used to validate them.
use crate::error::{BallotError, Result};
use crate::models::{EntityKey, Votable, VotableKey, Voter, VoterKey};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    // gid://<app>/<Kind>/<id>, kind may be namespaced with `::`
    static ref GLOBAL_ID: Regex =
        Regex::new(r"^gid://([^/]+)/([A-Za-z][A-Za-z0-9_]*(?:::[A-Za-z][A-Za-z0-9_]*)*)/([^/?#]+)$")
            .expect("global id pattern is valid");
}

/// A descriptor naming an entity without holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Pair { kind: String, id: String },
    Global(String),
}

impl EntityRef {
    pub fn pair(kind: impl Into<String>, id: impl Into<String>) -> Self {
        EntityRef::Pair {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn global(reference: impl Into<String>) -> Self {
        EntityRef::Global(reference.into())
    }
}

impl From<EntityKey> for EntityRef {
    fn from(key: EntityKey) -> Self {
        EntityRef::Pair {
            kind: key.kind,
            id: key.id,
        }
    }
}

/// Turns a loose reference into a concrete key. Hosts may implement this to
/// check existence against their own storage.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    async fn resolve(&self, reference: &EntityRef) -> Result<EntityKey>;
}

/// Loads host entities for a list of keys, preserving order.
#[async_trait]
pub trait EntityLoader: Send + Sync {
    type Entity: Send;

    async fn load(&self, keys: &[EntityKey]) -> Result<Vec<Self::Entity>>;
}

/// Accepts pairs as given and parses `gid://` references.
#[derive(Debug, Clone, Default)]
pub struct GlobalIdResolver {
    app: Option<String>,
}

impl GlobalIdResolver {
    pub fn new(app: Option<String>) -> Self {
        Self { app }
    }

    pub fn parse(&self, reference: &str) -> Result<EntityKey> {
        let captures = GLOBAL_ID
            .captures(reference.trim())
            .ok_or_else(|| BallotError::UnresolvableReference(reference.to_string()))?;

        if let Some(app) = &self.app {
            if &captures[1] != app.as_str() {
                return Err(BallotError::UnresolvableReference(format!(
                    "{} (expected app {})",
                    reference, app
                )));
            }
        }

        Ok(EntityKey::new(&captures[2], &captures[3]))
    }
}

#[async_trait]
impl EntityResolver for GlobalIdResolver {
    async fn resolve(&self, reference: &EntityRef) -> Result<EntityKey> {
        match reference {
            EntityRef::Pair { kind, id } if !kind.is_empty() && !id.is_empty() => {
                Ok(EntityKey::new(kind.as_str(), id.as_str()))
            }
            EntityRef::Pair { kind, id } => Err(BallotError::UnresolvableReference(format!(
                "incomplete pair {:?}/{:?}",
                kind, id
            ))),
            EntityRef::Global(reference) => self.parse(reference),
        }
    }
}

/// Which entity kinds may vote and be voted on, declared once at startup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    votables: HashMap<String, bool>,
    voters: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn votable<T: Votable>(mut self) -> Self {
        self.votables.insert(T::KIND.to_string(), T::SUMMARY_CACHE);
        self
    }

    pub fn voter<T: Voter>(mut self) -> Self {
        self.voters.insert(T::KIND.to_string());
        self
    }

    pub fn votable_key(&self, key: EntityKey) -> Result<VotableKey> {
        match self.votables.get(&key.kind) {
            Some(&cached) => Ok(VotableKey { entity: key, cached }),
            None => Err(BallotError::NotVotable(key.to_string())),
        }
    }

    pub fn voter_key(&self, key: EntityKey) -> Result<VoterKey> {
        if self.voters.contains(&key.kind) {
            Ok(VoterKey(key))
        } else {
            Err(BallotError::NotVoter(key.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;

    struct Song;
    struct Listener;

    impl Entity for Song {
        const KIND: &'static str = "Song";

        fn entity_id(&self) -> String {
            "1".to_string()
        }
    }

    impl Votable for Song {
        const SUMMARY_CACHE: bool = true;
    }

    impl Entity for Listener {
        const KIND: &'static str = "Listener";

        fn entity_id(&self) -> String {
            "1".to_string()
        }
    }

    impl Voter for Listener {}

    #[test]
    fn parses_global_ids() {
        let resolver = GlobalIdResolver::default();
        let key = resolver.parse("gid://jukebox/Song/42").unwrap();
        assert_eq!(key, EntityKey::new("Song", "42"));

        let key = resolver.parse("gid://jukebox/Music::Song/abc-1").unwrap();
        assert_eq!(key, EntityKey::new("Music::Song", "abc-1"));

        assert!(matches!(
            resolver.parse("Song/42"),
            Err(BallotError::UnresolvableReference(_))
        ));
    }

    #[test]
    fn pinned_app_rejects_foreign_ids() {
        let resolver = GlobalIdResolver::new(Some("jukebox".to_string()));
        assert!(resolver.parse("gid://jukebox/Song/1").is_ok());
        assert!(matches!(
            resolver.parse("gid://other/Song/1"),
            Err(BallotError::UnresolvableReference(_))
        ));
    }

    #[tokio::test]
    async fn resolves_pairs_and_rejects_blank_ones() {
        let resolver = GlobalIdResolver::default();
        let key = resolver.resolve(&EntityRef::pair("Song", "9")).await.unwrap();
        assert_eq!(key, EntityKey::new("Song", "9"));

        assert!(matches!(
            resolver.resolve(&EntityRef::pair("", "9")).await,
            Err(BallotError::UnresolvableReference(_))
        ));
    }

    #[test]
    fn registry_checks_capabilities() {
        let registry = Registry::new().votable::<Song>().voter::<Listener>();

        let song = registry.votable_key(EntityKey::new("Song", "3")).unwrap();
        assert!(song.cached);
        assert!(registry.voter_key(EntityKey::new("Listener", "3")).is_ok());

        assert!(matches!(
            registry.votable_key(EntityKey::new("Listener", "3")),
            Err(BallotError::NotVotable(_))
        ));
        assert!(matches!(
            registry.voter_key(EntityKey::new("Song", "3")),
            Err(BallotError::NotVoter(_))
        ));
    }
}
