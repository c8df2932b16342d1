use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    ballot::Ballot,
    candidate::{Candidate, NewCandidate},
    member::Member,
    note::{NewNote, Note},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Ballot collection
const BALLOTS: &str = "ballots";
impl MongoCollection for Ballot {
    const NAME: &'static str = BALLOTS;
}

// Member collection
const MEMBERS: &str = "members";
impl MongoCollection for Member {
    const NAME: &'static str = MEMBERS;
}

// Note collections
const NOTES: &str = "notes";
impl MongoCollection for Note {
    const NAME: &'static str = NOTES;
}
impl MongoCollection for NewNote {
    const NAME: &'static str = NOTES;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent. The unique ballot index is what enforces
/// one ballot per (candidate, voter); vote casting relies on it resolving
/// concurrent upserts.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Ballot collection.
    let ballot_index = IndexModel::builder()
        .keys(doc! {"candidate_id": 1, "voter_id": 1})
        .options(unique.clone())
        .build();
    Coll::<Ballot>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Member collection.
    let member_index = IndexModel::builder()
        .keys(doc! {"discord_id": 1})
        .options(unique)
        .build();
    Coll::<Member>::from_db(db)
        .create_index(member_index, None)
        .await?;

    // Note collection: list is always scoped to one candidate, newest first.
    let note_index = IndexModel::builder()
        .keys(doc! {"candidate_id": 1, "created_at": -1})
        .build();
    Coll::<Note>::from_db(db)
        .create_index(note_index, None)
        .await?;

    Ok(())
}
