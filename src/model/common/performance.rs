use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colour bracket for a performance score, matching the brackets the
/// analytics site itself displays.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Grey,
    Green,
    Blue,
    Purple,
    Orange,
    Pink,
    Gold,
}

impl ScoreTier {
    /// Bracket a 0-100 percentile score.
    pub fn from_score(score: f64) -> Self {
        if score >= 100.0 {
            Self::Gold
        } else if score >= 99.0 {
            Self::Pink
        } else if score >= 95.0 {
            Self::Orange
        } else if score >= 75.0 {
            Self::Purple
        } else if score >= 50.0 {
            Self::Blue
        } else if score >= 25.0 {
            Self::Green
        } else {
            Self::Grey
        }
    }
}

/// A point-in-time snapshot of a candidate's combat-log performance,
/// cached on the candidate record. Only ever overwritten by an explicit
/// refresh; never kept consistent with the upstream source automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Best-performance average percentile, 0-100.
    pub score: f64,
    pub tier: ScoreTier,
    /// Total boss kills on record.
    pub kills: u32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub fetched_at: DateTime<Utc>,
}

impl PerformanceSnapshot {
    pub fn new(score: f64, kills: u32) -> Self {
        Self {
            score,
            tier: ScoreTier::from_score(score),
            kills,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_brackets() {
        assert_eq!(ScoreTier::from_score(0.0), ScoreTier::Grey);
        assert_eq!(ScoreTier::from_score(24.9), ScoreTier::Grey);
        assert_eq!(ScoreTier::from_score(25.0), ScoreTier::Green);
        assert_eq!(ScoreTier::from_score(50.0), ScoreTier::Blue);
        assert_eq!(ScoreTier::from_score(74.9), ScoreTier::Blue);
        assert_eq!(ScoreTier::from_score(75.0), ScoreTier::Purple);
        assert_eq!(ScoreTier::from_score(95.0), ScoreTier::Orange);
        assert_eq!(ScoreTier::from_score(99.0), ScoreTier::Pink);
        assert_eq!(ScoreTier::from_score(100.0), ScoreTier::Gold);
    }

    #[test]
    fn snapshot_derives_tier_from_score() {
        let snapshot = PerformanceSnapshot::new(82.5, 120);
        assert_eq!(snapshot.tier, ScoreTier::Purple);
        assert_eq!(snapshot.kills, 120);
    }
}
