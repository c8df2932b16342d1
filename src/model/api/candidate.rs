use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateStatus, PerformanceSnapshot, ScoreTier},
    db::{Candidate, Links, Motivation, NewCandidate},
    mongodb::Id,
};

use super::id::ApiId;

/// An incoming application, as submitted by the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub name: String,
    pub class: String,
    pub spec: String,
    pub battle_tag: String,
    pub discord_id: String,
    pub motivation: Motivation,
    pub links: Links,
}

impl ApplicationSpec {
    /// Reject applications with blank identifying fields.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("class", &self.class),
            ("spec", &self.spec),
            ("battle_tag", &self.battle_tag),
            ("discord_id", &self.discord_id),
            ("links.logs_url", &self.links.logs_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::BadRequest(format!("Field `{field}` must not be empty")));
            }
        }
        Ok(())
    }

    /// Build the database record: fresh applications always start pending.
    pub fn into_candidate(self, performance: Option<PerformanceSnapshot>) -> NewCandidate {
        let now = Utc::now();
        NewCandidate {
            name: self.name,
            class: self.class,
            spec: self.spec,
            battle_tag: self.battle_tag,
            discord_id: self.discord_id,
            motivation: self.motivation,
            links: self.links,
            performance,
            status: CandidateStatus::Pending,
            message_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A performance snapshot as serialized into API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiPerformance {
    pub score: f64,
    pub tier: ScoreTier,
    pub kills: u32,
    pub fetched_at: DateTime<Utc>,
}

impl From<PerformanceSnapshot> for ApiPerformance {
    fn from(snapshot: PerformanceSnapshot) -> Self {
        Self {
            score: snapshot.score,
            tier: snapshot.tier,
            kills: snapshot.kills,
            fetched_at: snapshot.fetched_at,
        }
    }
}

/// A candidate as serialized into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResponse {
    pub id: ApiId,
    pub name: String,
    pub class: String,
    pub spec: String,
    pub battle_tag: String,
    pub discord_id: String,
    pub motivation: Motivation,
    pub links: Links,
    pub performance: Option<ApiPerformance>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Candidate> for CandidateResponse {
    fn from(candidate: Candidate) -> Self {
        let Candidate { id, candidate } = candidate;
        Self {
            id: id.into(),
            name: candidate.name,
            class: candidate.class,
            spec: candidate.spec,
            battle_tag: candidate.battle_tag,
            discord_id: candidate.discord_id,
            motivation: candidate.motivation,
            links: candidate.links,
            performance: candidate.performance.map(Into::into),
            status: candidate.status,
            created_at: candidate.created_at,
            updated_at: candidate.updated_at,
        }
    }
}

/// A GM's status decision for a single candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionSpec {
    pub status: CandidateStatus,
}

/// The status a candidate ended up in after a decision.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecisionOutcome {
    pub status: CandidateStatus,
}

/// A GM's direct status assignment for a set of candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDecisionSpec {
    pub ids: Vec<Id>,
    pub status: CandidateStatus,
}

/// Aggregate result of a bulk status change. Per-record failures do not
/// stop the remaining records from being attempted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub matched: u64,
    pub modified: u64,
    pub failed: u64,
}

impl BulkOutcome {
    pub fn record_success(&mut self, matched: u64, modified: u64) {
        self.matched += matched;
        self.modified += modified;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ApplicationSpec {
        ApplicationSpec {
            name: "Thrall".to_string(),
            class: "Shaman".to_string(),
            spec: "Enhancement".to_string(),
            battle_tag: "Thrall#1234".to_string(),
            discord_id: "180339587431219201".to_string(),
            motivation: Motivation {
                introduction: "Former warchief".to_string(),
                raid_experience: "Cleared everything".to_string(),
                reason: "Looking for a new home".to_string(),
            },
            links: Links {
                logs_url: "https://logs.example.com/character/eu/draenor/thrall".to_string(),
                armory_url: None,
            },
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let mut spec = spec();
        spec.name = "   ".to_string();
        assert!(matches!(spec.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn new_candidates_start_pending() {
        let candidate = spec().into_candidate(None);
        assert_eq!(candidate.status, CandidateStatus::Pending);
        assert!(candidate.message_ref.is_none());
        assert_eq!(candidate.created_at, candidate.updated_at);
    }

    #[test]
    fn bulk_outcome_aggregates_independently() {
        let mut outcome = BulkOutcome::default();
        outcome.record_success(1, 1);
        outcome.record_failure();
        outcome.record_success(1, 0); // matched but already in target status
        assert_eq!(
            outcome,
            BulkOutcome {
                matched: 2,
                modified: 1,
                failed: 1
            }
        );
    }
}
