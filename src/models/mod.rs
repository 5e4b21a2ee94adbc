use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Anything with a stable kind name and id that ballots can point at.
pub trait Entity {
    const KIND: &'static str;

    fn entity_id(&self) -> String;
}

/// An entity that can receive votes.
pub trait Votable: Entity {
    /// Whether this kind keeps a denormalized per-scope summary cache.
    const SUMMARY_CACHE: bool = false;
}

/// An entity that can cast votes.
pub trait Voter: Entity {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: String,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn of<T: Entity>(entity: &T) -> Self {
        Self::new(T::KIND, entity.entity_id())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoterKey(pub EntityKey);

impl VoterKey {
    pub fn of<T: Voter>(voter: &T) -> Self {
        Self(EntityKey::of(voter))
    }

    pub fn entity(&self) -> &EntityKey {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VotableKey {
    pub entity: EntityKey,
    /// Set from the votable kind's declaration, never discovered at runtime.
    pub cached: bool,
}

impl VotableKey {
    pub fn of<T: Votable>(votable: &T) -> Self {
        Self {
            entity: EntityKey::of(votable),
            cached: T::SUMMARY_CACHE,
        }
    }

    pub fn entity(&self) -> &EntityKey {
        &self.entity
    }
}

/// Partition label of the ledger. `None` is the default scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope(Option<String>);

impl Scope {
    pub fn default_scope() -> Self {
        Self(None)
    }

    pub fn named(label: impl Into<String>) -> Self {
        let label = label.into();
        if label.is_empty() {
            Self(None)
        } else {
            Self(Some(label))
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Key used in the summary cache blob; the default scope maps to "".
    pub fn cache_key(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    pub fn is_default(&self) -> bool {
        self.0.is_none()
    }
}

impl From<&str> for Scope {
    fn from(label: &str) -> Self {
        Scope::named(label)
    }
}

impl From<String> for Scope {
    fn from(label: String) -> Self {
        Scope::named(label)
    }
}

impl From<Option<&str>> for Scope {
    fn from(label: Option<&str>) -> Self {
        label.map(Scope::named).unwrap_or_default()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "<default>"),
        }
    }
}

/// One (voter, votable, scope) slot of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKey {
    pub voter: EntityKey,
    pub votable: EntityKey,
    pub scope: Scope,
}

/// A single ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub voter: EntityKey,
    pub votable: EntityKey,
    pub scope: Option<String>,
    /// `true` for up, `false` for down.
    pub flag: bool,
    pub weight: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(slot: &SlotKey, flag: bool, weight: i64) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            voter: slot.voter.clone(),
            votable: slot.votable.clone(),
            scope: slot.scope.label().map(str::to_string),
            flag,
            weight,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::from(self.scope.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post(u32);

    impl Entity for Post {
        const KIND: &'static str = "Post";

        fn entity_id(&self) -> String {
            self.0.to_string()
        }
    }

    impl Votable for Post {
        const SUMMARY_CACHE: bool = true;
    }

    #[test]
    fn empty_scope_is_default() {
        assert!(Scope::named("").is_default());
        assert_eq!(Scope::from(None), Scope::default_scope());
        assert_eq!(Scope::default_scope().cache_key(), "");
        assert_eq!(Scope::from("love").cache_key(), "love");
        assert_ne!(Scope::from("love"), Scope::default_scope());
    }

    #[test]
    fn votable_key_carries_cache_declaration() {
        let key = VotableKey::of(&Post(7));
        assert_eq!(key.entity, EntityKey::new("Post", "7"));
        assert!(key.cached);
        assert_eq!(key.entity.to_string(), "Post#7");
    }
}
