//! Error types for ballot operations.
use thiserror::Error;

/// Everything that can go wrong while casting, removing or reading ballots.
#[derive(Debug, Error)]
pub enum BallotError {
    #[error("Invalid vote word: {0}")]
    InvalidVoteWord(String),

    #[error("Not a votable entity: {0}")]
    NotVotable(String),

    #[error("Not a voter entity: {0}")]
    NotVoter(String),

    #[error("Unresolvable reference: {0}")]
    UnresolvableReference(String),

    /// The row a mutation pointed at disappeared between lookup and write.
    #[error("Vote not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache encoding error: {0}")]
    CacheEncoding(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BallotError {
    /// Whether the caller may re-attempt the whole operation from scratch.
    pub fn is_retryable(&self) -> bool {
        match self {
            BallotError::NotFound(_) => true,
            BallotError::Database(sqlx::Error::Database(db_err)) => {
                // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes
                db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| matches!(code & 0xff, 5 | 6))
                    .unwrap_or(false)
            }
            BallotError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BallotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_retryable() {
        assert!(BallotError::NotFound("abc".to_string()).is_retryable());
        assert!(!BallotError::InvalidVoteWord("maybe".to_string()).is_retryable());
        assert!(!BallotError::NotVoter("Post".to_string()).is_retryable());
    }
}
