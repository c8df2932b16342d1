use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One voter's stance on one candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
    Neutral,
}

impl Display for VoteChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Neutral => "neutral",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
#[error("Unrecognised vote choice: {0}")]
pub struct ParseChoiceError(String);

impl FromStr for VoteChoice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "neutral" => Ok(Self::Neutral),
            other => Err(ParseChoiceError(other.to_string())),
        }
    }
}

impl From<VoteChoice> for Bson {
    fn from(choice: VoteChoice) -> Self {
        to_bson(&choice).expect("Serialisation is infallible")
    }
}
