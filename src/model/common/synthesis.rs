use serde::Serialize;

use super::choice::VoteChoice;

/// Approval rate (in percent) at or above which a candidate is considered
/// to have overwhelming support. Display-only.
pub const SUPER_QUORUM_PERCENT: u32 = 85;

/// The tally of all current ballots for one candidate.
///
/// Derived on demand from the ballot collection, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteSynthesis {
    pub total: u32,
    pub yes: u32,
    pub no: u32,
    pub neutral: u32,
    /// Percentage of yes-votes among all cast votes, rounded to the
    /// nearest integer. Zero when there are no votes at all.
    pub approval_rate: u32,
    /// Whether the approval rate clears [`SUPER_QUORUM_PERCENT`].
    pub super_quorum: bool,
}

impl VoteSynthesis {
    /// Reduce a set of ballot choices to a tally. Order-irrelevant, pure.
    pub fn from_choices(choices: impl IntoIterator<Item = VoteChoice>) -> Self {
        let (mut yes, mut no, mut neutral) = (0u32, 0u32, 0u32);
        for choice in choices {
            match choice {
                VoteChoice::Yes => yes += 1,
                VoteChoice::No => no += 1,
                VoteChoice::Neutral => neutral += 1,
            }
        }
        let total = yes + no + neutral;
        let approval_rate = if total == 0 {
            0
        } else {
            (f64::from(yes) * 100.0 / f64::from(total)).round() as u32
        };
        Self {
            total,
            yes,
            no,
            neutral,
            approval_rate,
            super_quorum: approval_rate >= SUPER_QUORUM_PERCENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteChoice::{Neutral, No, Yes};

    #[test]
    fn empty_ledger_has_zero_approval() {
        let synthesis = VoteSynthesis::from_choices([]);
        assert_eq!(synthesis.total, 0);
        assert_eq!(synthesis.approval_rate, 0);
        assert!(!synthesis.super_quorum);
    }

    #[test]
    fn counts_sum_to_total() {
        let synthesis = VoteSynthesis::from_choices([Yes, No, Neutral, Yes, No, Yes]);
        assert_eq!(synthesis.total, 6);
        assert_eq!(
            synthesis.yes + synthesis.no + synthesis.neutral,
            synthesis.total
        );
    }

    #[test]
    fn approval_rounds_to_nearest_percent() {
        // 2/3 = 66.67% -> 67
        let synthesis = VoteSynthesis::from_choices([Yes, Yes, No]);
        assert_eq!(synthesis.approval_rate, 67);
        // 1/3 = 33.33% -> 33
        let synthesis = VoteSynthesis::from_choices([Yes, No, No]);
        assert_eq!(synthesis.approval_rate, 33);
    }

    #[test]
    fn fourth_neutral_voter_dilutes_approval() {
        let synthesis = VoteSynthesis::from_choices([Yes, Yes, No]);
        assert_eq!((synthesis.total, synthesis.yes, synthesis.no), (3, 2, 1));
        assert_eq!(synthesis.approval_rate, 67);

        let synthesis = VoteSynthesis::from_choices([Yes, Yes, No, Neutral]);
        assert_eq!(synthesis.total, 4);
        assert_eq!(synthesis.neutral, 1);
        assert_eq!(synthesis.approval_rate, 50);
    }

    #[test]
    fn super_quorum_boundary() {
        // 17/20 = 85% exactly.
        let mut choices = vec![Yes; 17];
        choices.extend([No, No, No]);
        let synthesis = VoteSynthesis::from_choices(choices);
        assert_eq!(synthesis.approval_rate, 85);
        assert!(synthesis.super_quorum);

        // 16/19 = 84.2% -> 84.
        let mut choices = vec![Yes; 16];
        choices.extend([No, No, No]);
        let synthesis = VoteSynthesis::from_choices(choices);
        assert_eq!(synthesis.approval_rate, 84);
        assert!(!synthesis.super_quorum);
    }

    #[test]
    fn unanimous_yes_is_full_approval() {
        let synthesis = VoteSynthesis::from_choices([Yes, Yes]);
        assert_eq!(synthesis.approval_rate, 100);
        assert!(synthesis.super_quorum);
    }
}
