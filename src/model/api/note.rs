use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::db::Note;

use super::id::ApiId;

/// An officer note as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSpec {
    pub content: String,
}

impl NoteSpec {
    /// The note body with surrounding whitespace stripped; empty notes are
    /// rejected before anything is written.
    pub fn trimmed_content(&self) -> Result<&str> {
        let content = self.content.trim();
        if content.is_empty() {
            Err(Error::BadRequest(
                "Note content must not be empty".to_string(),
            ))
        } else {
            Ok(content)
        }
    }
}

/// A note as serialized into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct NoteResponse {
    pub id: ApiId,
    pub author_id: ApiId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.into(),
            author_id: note.author_id.into(),
            content: note.note.content,
            created_at: note.note.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_content_rejected() {
        let spec = NoteSpec {
            content: " \t\n ".to_string(),
        };
        assert!(matches!(
            spec.trimmed_content(),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn content_is_trimmed() {
        let spec = NoteSpec {
            content: "  solid applicant  ".to_string(),
        };
        assert_eq!(spec.trimmed_content().unwrap(), "solid applicant");
    }
}
