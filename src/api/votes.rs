use rocket::{serde::json::Json, Route, State};

use crate::{
    discord::Notifier,
    error::{Error, Result},
    model::{
        api::{AuthToken, BallotSpec},
        common::{Role, VoteSynthesis},
        db::{Ballot, Candidate, Member},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, get_synthesis]
}

/// Cast or change a vote on a candidate. Member rank or above.
///
/// Responds with no body: callers re-read the tally if they want it. The
/// tally is still computed here to bring the Discord announcement up to
/// date off the request path.
#[post("/candidates/<candidate_id>/votes", data = "<ballot>", format = "json")]
async fn cast_vote(
    token: AuthToken,
    candidate_id: Id,
    ballot: Json<BallotSpec>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    notifier: &State<Notifier>,
) -> Result<()> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Member)?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;

    Ballot::upsert(&ballots, candidate_id, member.id, ballot.choice).await?;
    let synthesis = Ballot::synthesize(&ballots, candidate_id).await?;

    spawn_tally_sync(notifier, &candidate, synthesis);
    Ok(())
}

/// The current vote tally for a candidate. Member rank or above.
#[get("/candidates/<candidate_id>/votes")]
async fn get_synthesis(
    token: AuthToken,
    candidate_id: Id,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
) -> Result<Json<VoteSynthesis>> {
    let member = Member::lookup(&members, token.id).await?;
    member.require_role(Role::Member)?;

    if candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .is_none()
    {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }

    let synthesis = Ballot::synthesize(&ballots, candidate_id).await?;
    Ok(Json(synthesis))
}

/// Push a fresh tally to the candidate's announcement message without
/// blocking the caller. Candidates that were never announced have no
/// message to update.
pub fn spawn_tally_sync(notifier: &Notifier, candidate: &Candidate, synthesis: VoteSynthesis) {
    let Some(message_ref) = candidate.message_ref.clone() else {
        return;
    };
    let notifier = notifier.clone();
    let candidate_id = candidate.id;
    rocket::tokio::spawn(async move {
        notifier
            .sync_tally(&message_ref, candidate_id, &synthesis)
            .await;
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use crate::model::{
        common::{CandidateStatus, VoteChoice},
        db::{CandidateCore, Links, MessageRef, Motivation},
    };

    use super::*;

    fn candidate_with(message_ref: Option<MessageRef>) -> Candidate {
        let now = Utc::now();
        Candidate {
            id: Id::new(),
            candidate: CandidateCore {
                name: "Thrall".to_string(),
                class: "Shaman".to_string(),
                spec: "Enhancement".to_string(),
                battle_tag: "Thrall#1234".to_string(),
                discord_id: "180339587431219201".to_string(),
                motivation: Motivation {
                    introduction: "Former warchief".to_string(),
                    raid_experience: "Cleared everything".to_string(),
                    reason: "Looking for a new home".to_string(),
                },
                links: Links {
                    logs_url: "https://logs.example.com/character/eu/draenor/thrall".to_string(),
                    armory_url: None,
                },
                performance: None,
                status: CandidateStatus::Pending,
                message_ref,
                created_at: now,
                updated_at: now,
            },
        }
    }

    fn unreachable_notifier() -> Notifier {
        Notifier::new(
            "token".to_string(),
            "123".to_string(),
            Duration::from_millis(250),
        )
        .unwrap()
        .with_api_base("http://127.0.0.1:9")
    }

    /// Candidates whose announcement never succeeded have no message to
    /// edit. This test runs outside an async runtime, so any attempt to
    /// spawn a task here would panic.
    #[test]
    fn unannounced_candidates_get_no_sync() {
        let notifier = unreachable_notifier();
        let candidate = candidate_with(None);
        spawn_tally_sync(&notifier, &candidate, VoteSynthesis::from_choices([]));
    }

    /// The sync is dispatched off the request path: the call returns
    /// immediately and the push failing in the background has nothing to
    /// propagate to.
    #[rocket::async_test]
    async fn sync_failure_does_not_reach_the_vote_path() {
        let notifier = unreachable_notifier();
        let candidate = candidate_with(Some(MessageRef {
            channel_id: "1".to_string(),
            message_id: "2".to_string(),
        }));
        let synthesis = VoteSynthesis::from_choices([VoteChoice::Yes]);
        spawn_tally_sync(&notifier, &candidate, synthesis);
    }
}
