//! Shared domain types and the pure logic on them: candidate lifecycle,
//! vote choices and their synthesis, roles, and performance scoring.

mod choice;
pub use choice::{ParseChoiceError, VoteChoice};

mod performance;
pub use performance::{PerformanceSnapshot, ScoreTier};

mod role;
pub use role::Role;

mod status;
pub use status::CandidateStatus;

mod synthesis;
pub use synthesis::{VoteSynthesis, SUPER_QUORUM_PERCENT};
