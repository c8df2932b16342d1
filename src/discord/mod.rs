//! The Discord collaborator: outbound announcements and tally syncs, plus
//! inbound interaction verification and payloads.

mod interaction;
pub use interaction::{
    CustomIdError, Interaction, InteractionResponse, InteractionVerifier, SignatureHeaders,
    VoteAction, INTERACTION_MESSAGE_COMPONENT, INTERACTION_PING,
};

mod notify;
pub use notify::Notifier;
