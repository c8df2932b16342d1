use rocket::{
    serde::json::{serde_json, Json},
    Route, State,
};

use crate::{
    discord::{
        Interaction, InteractionResponse, InteractionVerifier, Notifier, SignatureHeaders,
        VoteAction, INTERACTION_MESSAGE_COMPONENT, INTERACTION_PING,
    },
    error::{Error, Result},
    model::{
        common::Role,
        db::{Ballot, Candidate, Member},
        mongodb::Coll,
    },
};

use super::votes::spawn_tally_sync;

pub fn routes() -> Vec<Route> {
    routes![interaction_callback]
}

/// Discord's interaction callback endpoint: signature check first, then
/// ping handshake or vote button press.
///
/// The body is taken raw because the signature covers its exact bytes;
/// deserialisation only happens once the signature holds.
#[post("/interactions", data = "<body>")]
async fn interaction_callback(
    headers: SignatureHeaders,
    body: &str,
    verifier: &State<InteractionVerifier>,
    members: Coll<Member>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    notifier: &State<Notifier>,
) -> Result<Json<InteractionResponse>> {
    if !verifier.verify(&headers.timestamp, body, &headers.signature) {
        return Err(Error::Unauthorized(
            "Invalid interaction signature".to_string(),
        ));
    }

    let interaction: Interaction = serde_json::from_str(body)
        .map_err(|err| Error::BadRequest(format!("Malformed interaction payload: {err}")))?;

    let response = match interaction.kind {
        INTERACTION_PING => InteractionResponse::pong(),
        INTERACTION_MESSAGE_COMPONENT => {
            handle_component(&interaction, &members, &candidates, &ballots, notifier).await?
        }
        _ => InteractionResponse::ephemeral("This interaction is not supported"),
    };
    Ok(Json(response))
}

/// Handle a vote button press.
///
/// Everything that can go wrong from the pressing user's side comes back
/// as an ephemeral message rather than an HTTP error, so Discord shows
/// them the reason instead of "interaction failed".
async fn handle_component(
    interaction: &Interaction,
    members: &Coll<Member>,
    candidates: &Coll<Candidate>,
    ballots: &Coll<Ballot>,
    notifier: &Notifier,
) -> Result<InteractionResponse> {
    let Some(data) = &interaction.data else {
        return Ok(InteractionResponse::ephemeral(
            "This interaction carries no component data",
        ));
    };
    let action = match VoteAction::parse(&data.custom_id) {
        Ok(action) => action,
        Err(err) => return Ok(InteractionResponse::ephemeral(err.to_string())),
    };

    let Some(discord_id) = interaction.user_id() else {
        return Ok(InteractionResponse::ephemeral(
            "Could not tell who pressed the button",
        ));
    };
    let Some(member) = Member::by_discord_id(members, discord_id).await? else {
        return Ok(InteractionResponse::ephemeral(
            "You are not registered on the recruitment portal",
        ));
    };
    if member.require_role(Role::Member).is_err() {
        return Ok(InteractionResponse::ephemeral(
            "Only full guild members may vote",
        ));
    }

    let Some(candidate) = candidates.find_one(action.candidate_id.as_doc(), None).await? else {
        return Ok(InteractionResponse::ephemeral(
            "That candidate no longer exists",
        ));
    };

    Ballot::upsert(ballots, candidate.id, member.id, action.choice).await?;
    let synthesis = Ballot::synthesize(ballots, candidate.id).await?;
    spawn_tally_sync(notifier, &candidate, synthesis);

    Ok(InteractionResponse::ephemeral(format!(
        "Vote recorded: {} ({}% approval, {} votes)",
        action.choice, synthesis.approval_rate, synthesis.total
    )))
}
