use std::fmt::{Display, Formatter};

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// A member's rank within the guild, synced from Discord roles and only
/// ever read by this service.
///
/// The derived ordering is the authorization hierarchy:
/// `Pending < Member < Officer < Gm`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Signed in but not recognised as a guild member.
    Pending,
    /// Rank-and-file: may vote on candidates.
    Member,
    /// May additionally annotate candidates, never decide.
    Officer,
    /// The Grand Master: sole authority over candidate status.
    Gm,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Member => "member",
            Self::Officer => "officer",
            Self::Gm => "gm",
        };
        write!(f, "{name}")
    }
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        to_bson(&role).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_ordering() {
        assert!(Role::Pending < Role::Member);
        assert!(Role::Member < Role::Officer);
        assert!(Role::Officer < Role::Gm);
    }

    #[test]
    fn gm_outranks_everything() {
        for role in [Role::Pending, Role::Member, Role::Officer] {
            assert!(Role::Gm > role);
        }
    }
}
