//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

pub mod ballot;
pub use ballot::{Ballot, BallotCore};

pub mod candidate;
pub use candidate::{Candidate, CandidateCore, Links, MessageRef, Motivation, NewCandidate};

pub mod member;
pub use member::{Member, MemberCore};

pub mod note;
pub use note::{NewNote, Note, NoteCore};
