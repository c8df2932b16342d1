//! API-compatible (e.g. de/serialisable) types: request specs, response
//! shapes, and the session token guard.

pub mod auth;
pub use auth::{AuthToken, AUTH_TOKEN_COOKIE};

mod candidate;
pub use candidate::{
    ApiPerformance, ApplicationSpec, BulkDecisionSpec, BulkOutcome, CandidateResponse,
    DecisionOutcome, DecisionSpec,
};

mod id;
pub use id::ApiId;

mod member;
pub use member::MemberResponse;

mod note;
pub use note::{NoteResponse, NoteSpec};

mod vote;
pub use vote::BallotSpec;
