use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{AuthToken, NoteResponse, NoteSpec},
        common::Role,
        db::{Candidate, Member, NewNote, Note, NoteCore},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![add_note, get_notes]
}

/// Attach an annotation to a candidate. Officer rank or above.
#[post("/candidates/<candidate_id>/notes", data = "<spec>", format = "json")]
async fn add_note(
    token: AuthToken,
    candidate_id: Id,
    spec: Json<NoteSpec>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    new_notes: Coll<NewNote>,
    notes: Coll<Note>,
) -> Result<Json<NoteResponse>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Officer)?;

    let content = spec.trimmed_content()?.to_string();
    if candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .is_none()
    {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }

    let note = NoteCore::new(candidate_id, member.id, content);
    let new_id: Id = new_notes
        .insert_one(&note, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    let note = notes
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Note {new_id}")))?;
    Ok(Json(note.into()))
}

/// List a candidate's annotations, newest first. Officer rank or above:
/// notes are officer-eyes-only, so the rank is checked on read too.
#[get("/candidates/<candidate_id>/notes")]
async fn get_notes(
    token: AuthToken,
    candidate_id: Id,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    notes: Coll<Note>,
) -> Result<Json<Vec<NoteResponse>>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Officer)?;

    if candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .is_none()
    {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }

    let filter = doc! {
        "candidate_id": candidate_id,
    };
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();
    let notes: Vec<Note> = notes.find(filter, options).await?.try_collect().await?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}
