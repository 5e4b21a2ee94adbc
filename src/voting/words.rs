use crate::error::{BallotError, Result};
use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref WORDS_THAT_MEAN_TRUE: HashSet<&'static str> = [
        "true", "yes", "y", "1", "up", "upvote", "like", "liked", "positive", "good",
    ]
    .into_iter()
    .collect();
    static ref WORDS_THAT_MEAN_FALSE: HashSet<&'static str> = [
        "false", "no", "n", "0", "down", "downvote", "dislike", "disliked", "negative", "bad",
    ]
    .into_iter()
    .collect();
}

/// Raw vote input as callers hand it over.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Default for VoteValue {
    fn default() -> Self {
        VoteValue::Bool(true)
    }
}

impl From<bool> for VoteValue {
    fn from(value: bool) -> Self {
        VoteValue::Bool(value)
    }
}

impl From<i32> for VoteValue {
    fn from(value: i32) -> Self {
        VoteValue::Int(value as i64)
    }
}

impl From<i64> for VoteValue {
    fn from(value: i64) -> Self {
        VoteValue::Int(value)
    }
}

impl From<f64> for VoteValue {
    fn from(value: f64) -> Self {
        VoteValue::Float(value)
    }
}

impl From<&str> for VoteValue {
    fn from(value: &str) -> Self {
        VoteValue::Text(value.to_string())
    }
}

impl From<String> for VoteValue {
    fn from(value: String) -> Self {
        VoteValue::Text(value)
    }
}

/// Maps a raw vote value to its direction: `true` is up, `false` is down.
pub fn truthy(value: &VoteValue) -> Result<bool> {
    match value {
        VoteValue::Bool(b) => Ok(*b),
        VoteValue::Int(n) => Ok(*n != 0),
        VoteValue::Float(f) => float_direction(*f, value),
        VoteValue::Text(text) => {
            let word = text.trim().to_lowercase();
            if WORDS_THAT_MEAN_TRUE.contains(word.as_str()) {
                Ok(true)
            } else if WORDS_THAT_MEAN_FALSE.contains(word.as_str()) {
                Ok(false)
            } else if let Ok(number) = word.parse::<f64>() {
                float_direction(number, value)
            } else {
                Err(BallotError::InvalidVoteWord(text.clone()))
            }
        }
    }
}

fn float_direction(number: f64, value: &VoteValue) -> Result<bool> {
    if number.is_nan() {
        return Err(BallotError::InvalidVoteWord(format!("{:?}", value)));
    }
    Ok(number != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_map_to_directions() {
        for word in ["yes", "Y", " UP ", "good", "like", "true", "1"] {
            assert!(truthy(&word.into()).unwrap(), "{} should be up", word);
        }
        for word in ["no", "N", "Down", "bad", "dislike", "FALSE", "0"] {
            assert!(!truthy(&word.into()).unwrap(), "{} should be down", word);
        }
    }

    #[test]
    fn numbers_are_nonzero_truthy() {
        assert!(truthy(&VoteValue::Int(-3)).unwrap());
        assert!(!truthy(&VoteValue::Int(0)).unwrap());
        assert!(truthy(&VoteValue::Float(0.5)).unwrap());
        assert!(!truthy(&VoteValue::Float(0.0)).unwrap());
        assert!(truthy(&"2".into()).unwrap());
        assert!(!truthy(&"0.0".into()).unwrap());
        assert!(truthy(&true.into()).unwrap());
    }

    #[test]
    fn unknown_words_are_rejected() {
        assert!(matches!(
            truthy(&"maybe".into()),
            Err(BallotError::InvalidVoteWord(w)) if w == "maybe"
        ));
        assert!(matches!(truthy(&"".into()), Err(BallotError::InvalidVoteWord(_))));
        assert!(matches!(
            truthy(&VoteValue::Float(f64::NAN)),
            Err(BallotError::InvalidVoteWord(_))
        ));
    }
}
