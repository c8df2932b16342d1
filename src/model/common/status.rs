use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the candidate lifecycle. Every state is reachable from every
/// other state directly; none are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Awaiting a decision. The initial state of every application.
    Pending,
    Accepted,
    Rejected,
    Waitlist,
}

impl CandidateStatus {
    /// Apply a GM decision to the current status.
    ///
    /// Deciding the status a candidate already has reverts them to review
    /// instead (click to decide, click again to reconsider); anything else
    /// is a single direct transition.
    #[must_use]
    pub fn decide(self, target: CandidateStatus) -> CandidateStatus {
        if self == target {
            CandidateStatus::Pending
        } else {
            target
        }
    }
}

impl From<CandidateStatus> for Bson {
    fn from(status: CandidateStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_decision_reverts_to_pending() {
        assert_eq!(
            CandidateStatus::Accepted.decide(CandidateStatus::Accepted),
            CandidateStatus::Pending
        );
    }

    #[test]
    fn cross_status_decision_is_a_single_hop() {
        assert_eq!(
            CandidateStatus::Rejected.decide(CandidateStatus::Accepted),
            CandidateStatus::Accepted
        );
    }

    #[test]
    fn waitlist_toggle_round_trip() {
        let status = CandidateStatus::Pending.decide(CandidateStatus::Waitlist);
        assert_eq!(status, CandidateStatus::Waitlist);
        let status = status.decide(CandidateStatus::Waitlist);
        assert_eq!(status, CandidateStatus::Pending);
    }

    #[test]
    fn deciding_pending_from_pending_stays_pending() {
        assert_eq!(
            CandidateStatus::Pending.decide(CandidateStatus::Pending),
            CandidateStatus::Pending
        );
    }
}
