use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{VoteChoice, VoteSynthesis},
    db::{MessageRef, NewCandidate},
    mongodb::Id,
};

use super::interaction::VoteAction;

const API_BASE: &str = "https://discord.com/api/v10";

// Discord component type / button style constants.
const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;
const STYLE_SUCCESS: u8 = 3;
const STYLE_DANGER: u8 = 4;
const STYLE_SECONDARY: u8 = 2;

/// Pushes candidate announcements and tally updates to the guild's
/// recruitment channel.
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: String,
    channel_id: String,
    api_base: String,
}

impl Notifier {
    pub fn new(
        bot_token: String,
        channel_id: String,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            bot_token,
            channel_id,
            api_base: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Post the announcement message for a fresh application, with its
    /// three vote buttons at zero.
    ///
    /// The returned reference is what later tally syncs edit. Callers treat
    /// failure as "no announcement": the candidate simply never gets a
    /// message ref.
    pub async fn announce(&self, candidate_id: Id, candidate: &NewCandidate) -> Result<MessageRef> {
        let body = MessageBody {
            content: format!(
                "New applicant: **{}** ({} {})",
                candidate.name, candidate.spec, candidate.class
            ),
            components: vote_components(candidate_id, &VoteSynthesis::from_choices([])),
        };
        let url = format!("{}/channels/{}/messages", self.api_base, self.channel_id);
        let message: AnnouncedMessage = self.post_json(&url, &body).await?;
        Ok(MessageRef {
            channel_id: message.channel_id,
            message_id: message.id,
        })
    }

    /// Best-effort push of a fresh tally to the announcement message's
    /// buttons. Failures are logged and swallowed: the triggering vote has
    /// already committed and must not be affected.
    pub async fn sync_tally(
        &self,
        message: &MessageRef,
        candidate_id: Id,
        synthesis: &VoteSynthesis,
    ) {
        if let Err(err) = self.edit_tally(message, candidate_id, synthesis).await {
            warn!(
                "Failed to sync vote tally to message {}: {err}",
                message.message_id
            );
        }
    }

    async fn edit_tally(
        &self,
        message: &MessageRef,
        candidate_id: Id,
        synthesis: &VoteSynthesis,
    ) -> Result<()> {
        let body = ComponentsPatch {
            components: vote_components(candidate_id, synthesis),
        };
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.api_base, message.channel_id, message.message_id
        );
        let response = self
            .http
            .patch(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::ExternalService(format!("Discord unreachable: {err}")))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "Discord returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(body)
            .send()
            .await
            .map_err(|err| Error::ExternalService(format!("Discord unreachable: {err}")))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "Discord returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| Error::ExternalService(format!("Invalid Discord response: {err}")))
    }
}

#[derive(Debug, Serialize)]
struct MessageBody {
    content: String,
    components: Vec<ActionRow>,
}

#[derive(Debug, Serialize)]
struct ComponentsPatch {
    components: Vec<ActionRow>,
}

#[derive(Debug, Deserialize)]
struct AnnouncedMessage {
    id: String,
    channel_id: String,
}

#[derive(Debug, Serialize)]
struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<Button>,
}

#[derive(Debug, Serialize)]
struct Button {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    label: String,
    custom_id: String,
}

/// The three mutually exclusive choice buttons, labelled with current counts.
fn vote_components(candidate_id: Id, synthesis: &VoteSynthesis) -> Vec<ActionRow> {
    let button = |choice: VoteChoice, style: u8, label: String| Button {
        kind: COMPONENT_BUTTON,
        style,
        label,
        custom_id: VoteAction::custom_id(candidate_id, choice),
    };
    vec![ActionRow {
        kind: COMPONENT_ACTION_ROW,
        components: vec![
            button(
                VoteChoice::Yes,
                STYLE_SUCCESS,
                format!("Yes ({})", synthesis.yes),
            ),
            button(
                VoteChoice::No,
                STYLE_DANGER,
                format!("No ({})", synthesis.no),
            ),
            button(
                VoteChoice::Neutral,
                STYLE_SECONDARY,
                format!("Neutral ({})", synthesis.neutral),
            ),
        ],
    }]
}

#[cfg(test)]
mod tests {
    use crate::model::common::VoteChoice::{No, Yes};

    use super::*;

    /// The tally push is a best-effort side effect: an unreachable Discord
    /// endpoint must come back as a normal return, never an error or panic,
    /// because the triggering vote has already committed.
    #[rocket::async_test]
    async fn sync_failure_is_swallowed() {
        let notifier = Notifier::new(
            "token".to_string(),
            "123".to_string(),
            Duration::from_millis(250),
        )
        .unwrap()
        // Discard port: nothing listens here, the request fails at connect.
        .with_api_base("http://127.0.0.1:9");

        let message = MessageRef {
            channel_id: "1".to_string(),
            message_id: "2".to_string(),
        };
        let synthesis = VoteSynthesis::from_choices([Yes, No]);
        notifier.sync_tally(&message, Id::new(), &synthesis).await;
    }

    #[test]
    fn buttons_carry_counts_and_custom_ids() {
        let id = Id::new();
        let synthesis = VoteSynthesis::from_choices([Yes, Yes, No]);
        let rows = vote_components(id, &synthesis);

        assert_eq!(rows.len(), 1);
        let buttons = &rows[0].components;
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].label, "Yes (2)");
        assert_eq!(buttons[1].label, "No (1)");
        assert_eq!(buttons[2].label, "Neutral (0)");
        assert_eq!(buttons[0].custom_id, format!("vote:{id}:yes"));
        assert_eq!(buttons[2].custom_id, format!("vote:{id}:neutral"));
    }
}
