use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};
use mongodb::options::UpdateOptions;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::{VoteChoice, VoteSynthesis},
    mongodb::{Coll, Id},
};

/// One voter's current choice for one candidate, as stored in the database.
///
/// At most one exists per (candidate, voter); the unique index on those two
/// fields enforces this and [`Ballot::upsert`] relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotCore {
    pub candidate_id: Id,
    pub voter_id: Id,
    pub choice: VoteChoice,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A ballot from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}

impl Ballot {
    /// Record a voter's choice for a candidate.
    ///
    /// A repeat vote overwrites the choice in place; the original cast
    /// timestamp is kept. Concurrent casts for the same voter are resolved
    /// by the unique (candidate_id, voter_id) index at the database.
    pub async fn upsert(
        ballots: &Coll<Ballot>,
        candidate_id: Id,
        voter_id: Id,
        choice: VoteChoice,
    ) -> Result<()> {
        let options = UpdateOptions::builder().upsert(true).build();
        ballots
            .update_one(
                ledger_filter(candidate_id, voter_id),
                cast_update(choice),
                options,
            )
            .await?;
        Ok(())
    }

    /// Tally all current ballots for the given candidate.
    pub async fn synthesize(ballots: &Coll<Ballot>, candidate_id: Id) -> Result<VoteSynthesis> {
        let filter = doc! {
            "candidate_id": candidate_id,
        };
        let ballots: Vec<Ballot> = ballots.find(filter, None).await?.try_collect().await?;
        Ok(VoteSynthesis::from_choices(
            ballots.into_iter().map(|b| b.choice),
        ))
    }
}

/// The filter every cast addresses: exactly the fields of the unique ballot
/// index, so a repeat vote matches the voter's existing ballot instead of
/// inserting a second one.
fn ledger_filter(candidate_id: Id, voter_id: Id) -> Document {
    doc! {
        "candidate_id": candidate_id,
        "voter_id": voter_id,
    }
}

/// The update applied by a cast: overwrite the choice, assign the cast
/// timestamp only when the ballot is first created.
fn cast_update(choice: VoteChoice) -> Document {
    doc! {
        "$set": { "choice": choice },
        "$setOnInsert": {
            "created_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_casts_address_a_single_ballot() {
        let (candidate_id, voter_id) = (Id::new(), Id::new());
        let filter = ledger_filter(candidate_id, voter_id);

        // The filter carries the unique index fields and nothing else, so
        // two casts for the same (candidate, voter) hit the same document.
        assert_eq!(filter.keys().count(), 2);
        assert_eq!(filter.get_object_id("candidate_id").unwrap(), *candidate_id);
        assert_eq!(filter.get_object_id("voter_id").unwrap(), *voter_id);

        // A different voter addresses a different document.
        let other = ledger_filter(candidate_id, Id::new());
        assert_ne!(filter, other);
    }

    #[test]
    fn later_cast_overwrites_choice_and_keeps_cast_time() {
        let update = cast_update(VoteChoice::No);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("choice").unwrap(), "no");
        assert!(set.get("created_at").is_none());

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert!(on_insert.get_datetime("created_at").is_ok());
        assert!(on_insert.get("choice").is_none());
    }
}
