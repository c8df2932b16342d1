use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateStatus, PerformanceSnapshot},
    mongodb::Id,
};

/// The applicant's written pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motivation {
    pub introduction: String,
    pub raid_experience: String,
    pub reason: String,
}

/// External profile links supplied by the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Combat-log profile URL; the source for the performance snapshot.
    pub logs_url: String,
    pub armory_url: Option<String>,
}

/// Reference to the Discord announcement message whose vote buttons get
/// kept in sync with the tally. Absent if the announcement failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub class: String,
    pub spec: String,
    pub battle_tag: String,
    pub discord_id: String,
    pub motivation: Motivation,
    pub links: Links,
    /// Point-in-time analytics cache; overwritten only by an explicit refresh.
    pub performance: Option<PerformanceSnapshot>,
    pub status: CandidateStatus,
    pub message_ref: Option<MessageRef>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A candidate without an ID, ready for insertion.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
