use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// An officer's annotation on a candidate, as stored in the database.
/// Notes are append-only: there is no update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCore {
    pub candidate_id: Id,
    pub author_id: Id,
    pub content: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl NoteCore {
    /// Create a note with a server-assigned timestamp.
    pub fn new(candidate_id: Id, author_id: Id, content: String) -> Self {
        Self {
            candidate_id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// A note without an ID, ready for insertion.
pub type NewNote = NoteCore;

/// A note from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub note: NoteCore,
}

impl Deref for Note {
    type Target = NoteCore;

    fn deref(&self) -> &Self::Target {
        &self.note
    }
}
