pub mod summary;
pub mod words;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for one votable within one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: i64,
    pub up: i64,
    pub down: i64,
    pub score: i64,
    pub weighted_total: i64,
    pub weighted_score: i64,
    pub weighted_average: f64,
}

impl Summary {
    /// Builds the seven fields from raw ledger aggregates. Every sum comes
    /// from the store, which rejects overflow.
    pub fn from_tallies(all: Tally, up: Tally, down: Tally) -> Self {
        let total = all.count;
        let weighted_score = all.signed_weight_sum;

        // Zero votes means a zero average, not a division error
        let weighted_average = if total > 0 {
            weighted_score as f64 / total as f64
        } else {
            0.0
        };

        Self {
            total,
            up: up.count,
            down: down.count,
            score: up.count - down.count,
            weighted_total: all.weight_sum,
            weighted_score,
            weighted_average,
        }
    }
}

/// Count and weight sums over a set of ledger rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: i64,
    pub weight_sum: i64,
    /// Up weights minus down weights.
    pub signed_weight_sum: i64,
}

/// The persisted `cached_ballot_summary` blob: scope label ("" for the
/// default scope) to summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryCache(BTreeMap<String, Summary>);

impl SummaryCache {
    pub fn get(&self, scope_key: &str) -> Option<&Summary> {
        self.0.get(scope_key)
    }

    pub fn replace(&mut self, scope_key: &str, summary: Summary) {
        self.0.insert(scope_key.to_string(), summary);
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_weights_scenario() {
        let summary = Summary::from_tallies(
            Tally {
                count: 2,
                weight_sum: 5,
                signed_weight_sum: 3,
            },
            Tally {
                count: 1,
                weight_sum: 4,
                signed_weight_sum: 4,
            },
            Tally {
                count: 1,
                weight_sum: 1,
                signed_weight_sum: -1,
            },
        );

        assert_eq!(summary.total, 2);
        assert_eq!(summary.up, 1);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.weighted_total, 5);
        assert_eq!(summary.weighted_score, 3);
        assert_eq!(summary.weighted_average, 1.5);
    }

    #[test]
    fn zero_total_has_zero_average() {
        let summary =
            Summary::from_tallies(Tally::default(), Tally::default(), Tally::default());
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.weighted_average, 0.0);
    }

    #[test]
    fn cache_blob_is_flat_per_scope() {
        let mut cache = SummaryCache::default();
        cache.replace(
            "",
            Summary {
                total: 1,
                up: 1,
                score: 1,
                weighted_total: 1,
                weighted_score: 1,
                weighted_average: 1.0,
                ..Summary::default()
            },
        );
        cache.replace("love", Summary::default());

        let json: serde_json::Value =
            serde_json::from_str(&cache.to_json().unwrap()).unwrap();
        assert_eq!(json[""]["total"], 1);
        assert_eq!(json["love"]["weighted_average"], 0.0);

        let back = SummaryCache::from_json(&cache.to_json().unwrap()).unwrap();
        assert_eq!(back, cache);
        assert_eq!(back.scopes().collect::<Vec<_>>(), vec!["", "love"]);
    }
}
