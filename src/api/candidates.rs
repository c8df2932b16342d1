use chrono::Utc;
use mongodb::{
    bson::{doc, to_bson, DateTime as BsonDateTime},
    options::FindOptions,
    Client,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    analytics::{AnalyticsClient, CharacterRef},
    discord::Notifier,
    error::{Error, Result},
    model::{
        api::{
            ApplicationSpec, AuthToken, BulkDecisionSpec, BulkOutcome, CandidateResponse,
            DecisionOutcome, DecisionSpec,
        },
        common::{CandidateStatus, Role},
        db::{Ballot, Candidate, Member, NewCandidate, Note},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        submit_application,
        get_candidates,
        get_candidate,
        refresh_performance,
        decide,
        bulk_decide,
        delete_candidate,
    ]
}

/// Submit a new application. Public: the applicant has no session yet.
///
/// The analytics lookup and the Discord announcement are both best-effort
/// here; neither may lose the application.
#[post("/candidates", data = "<spec>", format = "json")]
async fn submit_application(
    spec: Json<ApplicationSpec>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
    analytics: &State<AnalyticsClient>,
    notifier: &State<Notifier>,
) -> Result<Json<CandidateResponse>> {
    let spec = spec.0;
    spec.validate()?;

    // Point-in-time performance snapshot; a failed lookup is cached as None.
    let performance = match CharacterRef::from_profile_url(&spec.links.logs_url) {
        Ok(character) => match analytics.fetch_snapshot(&character).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("Analytics lookup failed for new application: {err}");
                None
            }
        },
        Err(err) => {
            warn!("Could not parse combat-log profile URL: {err}");
            None
        }
    };

    let candidate = spec.into_candidate(performance);
    let new_id: Id = new_candidates
        .insert_one(&candidate, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    // Announce to the recruitment channel; without an announcement the
    // candidate simply never gets tally syncs.
    match notifier.announce(new_id, &candidate).await {
        Ok(message_ref) => {
            let update = doc! {
                "$set": {
                    "message_ref": to_bson(&message_ref).expect("Serialisation is infallible"),
                }
            };
            candidates.update_one(new_id.as_doc(), update, None).await?;
        }
        Err(err) => warn!("Failed to announce candidate {new_id}: {err}"),
    }

    let candidate = candidates
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {new_id}")))?;
    Ok(Json(candidate.into()))
}

/// List candidates, newest first, optionally filtered by status.
#[get("/candidates?<status>")]
async fn get_candidates(
    token: AuthToken,
    status: Option<CandidateStatus>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateResponse>>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Member)?;

    let filter = status.map(|status| doc! { "status": status });
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();
    let candidates: Vec<Candidate> = candidates.find(filter, options).await?.try_collect().await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[get("/candidates/<candidate_id>")]
async fn get_candidate(
    token: AuthToken,
    candidate_id: Id,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateResponse>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Member)?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    Ok(Json(candidate.into()))
}

/// Re-fetch the analytics snapshot, overwriting the cached one.
///
/// Unlike at submission time, the lookup is the whole point here, so its
/// failure is surfaced to the caller.
#[post("/candidates/<candidate_id>/refresh")]
async fn refresh_performance(
    token: AuthToken,
    candidate_id: Id,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    analytics: &State<AnalyticsClient>,
) -> Result<Json<CandidateResponse>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Officer)?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let character = CharacterRef::from_profile_url(&candidate.links.logs_url)?;
    let snapshot = analytics.fetch_snapshot(&character).await?;

    let update = doc! {
        "$set": {
            "performance": to_bson(&snapshot).expect("Serialisation is infallible"),
            "updated_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    candidates
        .update_one(candidate_id.as_doc(), update, None)
        .await?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    Ok(Json(candidate.into()))
}

/// Decide a single candidate's status. GM only.
///
/// Repeating the candidate's current status reverts them to pending; see
/// [`CandidateStatus::decide`]. Deliberately does not touch the Discord
/// announcement: its buttons reflect vote tallies, not decisions.
///
/// [`CandidateStatus::decide`]: crate::model::common::CandidateStatus::decide
#[post("/candidates/<candidate_id>/status", data = "<decision>", format = "json")]
async fn decide(
    token: AuthToken,
    candidate_id: Id,
    decision: Json<DecisionSpec>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
) -> Result<Json<DecisionOutcome>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Gm)?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    let status = candidate.status.decide(decision.status);
    let update = doc! {
        "$set": {
            "status": status,
            "updated_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    candidates
        .update_one(candidate_id.as_doc(), update, None)
        .await?;

    Ok(Json(DecisionOutcome { status }))
}

/// Assign a status to a set of candidates. GM only.
///
/// Direct assignment, no toggle. Each record is attempted independently;
/// one failure never stops the rest.
#[post("/candidates/status", data = "<bulk>", format = "json")]
async fn bulk_decide(
    token: AuthToken,
    bulk: Json<BulkDecisionSpec>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
) -> Result<Json<BulkOutcome>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Gm)?;

    let update = doc! {
        "$set": {
            "status": bulk.status,
            "updated_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    let mut outcome = BulkOutcome::default();
    for id in &bulk.ids {
        match candidates
            .update_one(id.as_doc(), update.clone(), None)
            .await
        {
            Ok(result) => outcome.record_success(result.matched_count, result.modified_count),
            Err(err) => {
                warn!("Bulk status update failed for candidate {id}: {err}");
                outcome.record_failure();
            }
        }
    }
    Ok(Json(outcome))
}

/// Delete a candidate and everything hanging off them. GM only.
#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    token: AuthToken,
    candidate_id: Id,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    notes: Coll<Note>,
    db_client: &State<Client>,
) -> Result<()> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Gm)?;

    // Atomically delete the candidate and all associated data.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = candidates
        .delete_one_with_session(candidate_id.as_doc(), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }

    let filter = doc! {
        "candidate_id": candidate_id,
    };
    ballots
        .delete_many_with_session(filter.clone(), None, &mut session)
        .await?;
    notes
        .delete_many_with_session(filter, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(())
}
