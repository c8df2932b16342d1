use serde::{Deserialize, Serialize};

use crate::model::common::VoteChoice;

/// A ballot the caller wishes to cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    pub choice: VoteChoice,
}
