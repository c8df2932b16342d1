use data_encoding::HEXLOWER_PERMISSIVE;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::model::{common::VoteChoice, mongodb::Id};

/// Interaction kinds we handle (Discord `InteractionType`).
pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_MESSAGE_COMPONENT: u8 = 3;

// Discord `InteractionCallbackType` values.
const CALLBACK_PONG: u8 = 1;
const CALLBACK_CHANNEL_MESSAGE: u8 = 4;

/// Message flag marking a response as visible only to the invoking user.
const FLAG_EPHEMERAL: u32 = 1 << 6;

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Verifies the Ed25519 signature Discord attaches to every interaction
/// callback. Unsigned or tampered payloads must never reach a handler.
pub struct InteractionVerifier {
    key: VerifyingKey,
}

#[derive(Debug, Error)]
pub enum InvalidKey {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] data_encoding::DecodeError),
    #[error("public key must be exactly 32 bytes")]
    Length,
    #[error(transparent)]
    Key(#[from] ed25519_dalek::SignatureError),
}

impl InteractionVerifier {
    pub fn new(hex_key: &str) -> Result<Self, InvalidKey> {
        let bytes = HEXLOWER_PERMISSIVE.decode(hex_key.as_bytes())?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| InvalidKey::Length)?;
        Ok(Self {
            key: VerifyingKey::from_bytes(&bytes)?,
        })
    }

    /// Check the signature over `timestamp || body`.
    pub fn verify(&self, timestamp: &str, body: &str, signature_hex: &str) -> bool {
        let Ok(sig_bytes) = HEXLOWER_PERMISSIVE.decode(signature_hex.as_bytes()) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body.as_bytes());
        self.key.verify(&message, &signature).is_ok()
    }
}

/// The two signature headers of an interaction callback, extracted before
/// the body is trusted at all.
pub struct SignatureHeaders {
    pub signature: String,
    pub timestamp: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SignatureHeaders {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let signature = req.headers().get_one(SIGNATURE_HEADER);
        let timestamp = req.headers().get_one(TIMESTAMP_HEADER);
        match (signature, timestamp) {
            (Some(signature), Some(timestamp)) => Outcome::Success(Self {
                signature: signature.to_string(),
                timestamp: timestamp.to_string(),
            }),
            _ => Outcome::Error((
                Status::Unauthorized,
                Error::Unauthorized("Missing interaction signature headers".to_string()),
            )),
        }
    }
}

/// An inbound interaction payload, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<ComponentData>,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub user: Option<DiscordUser>,
}

impl Interaction {
    /// The invoking Discord user id; under `member` in guild channels and
    /// top-level in DMs.
    pub fn user_id(&self) -> Option<&str> {
        self.member
            .as_ref()
            .map(|m| m.user.id.as_str())
            .or_else(|| self.user.as_ref().map(|u| u.id.as_str()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ComponentData {
    pub custom_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GuildMember {
    pub user: DiscordUser,
}

#[derive(Debug, Deserialize)]
pub struct DiscordUser {
    pub id: String,
}

/// An outbound interaction callback.
#[derive(Debug, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData>,
}

#[derive(Debug, Serialize)]
struct ResponseData {
    content: String,
    flags: u32,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: CALLBACK_PONG,
            data: None,
        }
    }

    /// A message only the invoking user can see.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: CALLBACK_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
                flags: FLAG_EPHEMERAL,
            }),
        }
    }
}

/// A vote encoded in a button's `custom_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteAction {
    pub candidate_id: Id,
    pub choice: VoteChoice,
}

impl VoteAction {
    /// The `custom_id` carried by the corresponding button.
    pub fn custom_id(candidate_id: Id, choice: VoteChoice) -> String {
        format!("vote:{candidate_id}:{choice}")
    }

    /// Parse a component `custom_id`. The id and choice come from an
    /// external client, so both are validated before any lookup happens.
    pub fn parse(custom_id: &str) -> Result<Self, CustomIdError> {
        let mut parts = custom_id.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("vote"), Some(id), Some(choice)) => {
                let candidate_id = id
                    .parse::<Id>()
                    .map_err(|_| CustomIdError::BadCandidateId(id.to_string()))?;
                let choice = choice
                    .parse::<VoteChoice>()
                    .map_err(|_| CustomIdError::BadChoice(choice.to_string()))?;
                Ok(Self {
                    candidate_id,
                    choice,
                })
            }
            _ => Err(CustomIdError::UnknownComponent(custom_id.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum CustomIdError {
    #[error("Unrecognised component: {0}")]
    UnknownComponent(String),
    #[error("Malformed candidate id: {0}")]
    BadCandidateId(String),
    #[error("Unrecognised vote choice: {0}")]
    BadChoice(String),
}

#[cfg(test)]
mod tests {
    use data_encoding::HEXLOWER;
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;

    fn verifier_for(key: &SigningKey) -> InteractionVerifier {
        let hex = HEXLOWER.encode(key.verifying_key().as_bytes());
        InteractionVerifier::new(&hex).unwrap()
    }

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = verifier_for(&key);

        let timestamp = "1700000000";
        let body = r#"{"type":1}"#;
        let signature = key.sign(format!("{timestamp}{body}").as_bytes());
        let signature_hex = HEXLOWER.encode(&signature.to_bytes());

        assert!(verifier.verify(timestamp, body, &signature_hex));
    }

    #[test]
    fn rejects_a_tampered_body() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = verifier_for(&key);

        let timestamp = "1700000000";
        let signature = key.sign(format!("{timestamp}{}", r#"{"type":1}"#).as_bytes());
        let signature_hex = HEXLOWER.encode(&signature.to_bytes());

        assert!(!verifier.verify(timestamp, r#"{"type":3}"#, &signature_hex));
    }

    #[test]
    fn rejects_garbage_signatures() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = verifier_for(&key);

        assert!(!verifier.verify("1700000000", "{}", "not-hex"));
        assert!(!verifier.verify("1700000000", "{}", "abcd"));
    }

    #[test]
    fn custom_id_round_trip() {
        let id = Id::new();
        let custom_id = VoteAction::custom_id(id, VoteChoice::Neutral);
        let action = VoteAction::parse(&custom_id).unwrap();
        assert_eq!(action.candidate_id, id);
        assert_eq!(action.choice, VoteChoice::Neutral);
    }

    #[test]
    fn malformed_candidate_id_rejected() {
        assert!(matches!(
            VoteAction::parse("vote:not-an-id:yes"),
            Err(CustomIdError::BadCandidateId(_))
        ));
    }

    #[test]
    fn unknown_choice_rejected() {
        let id = Id::new();
        assert!(matches!(
            VoteAction::parse(&format!("vote:{id}:maybe")),
            Err(CustomIdError::BadChoice(_))
        ));
    }

    #[test]
    fn unrelated_component_rejected() {
        assert!(matches!(
            VoteAction::parse("open-ticket:123"),
            Err(CustomIdError::UnknownComponent(_))
        ));
    }
}
