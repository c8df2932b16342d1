use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::Role,
    mongodb::{Coll, Id},
};

/// Core member data, as stored in the database.
///
/// The role is assigned by the external Discord role sync; this service
/// only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCore {
    pub email: String,
    pub discord_id: String,
    pub role: Role,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_seen: DateTime<Utc>,
}

/// A member from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub member: MemberCore,
}

impl Deref for Member {
    type Target = MemberCore;

    fn deref(&self) -> &Self::Target {
        &self.member
    }
}

impl Member {
    /// Resolve the caller's member record, freshly, from their session id.
    ///
    /// Every protected operation starts here: the role is never taken from
    /// the token or any other client-supplied value.
    pub async fn lookup(members: &Coll<Member>, id: Id) -> Result<Member> {
        members
            .find_one(id.as_doc(), None)
            .await?
            .ok_or_else(|| Error::Unauthorized("No member record for caller".to_string()))
    }

    /// Resolve a member from their Discord user id, for interaction callbacks.
    pub async fn by_discord_id(members: &Coll<Member>, discord_id: &str) -> Result<Option<Member>> {
        let filter = doc! { "discord_id": discord_id };
        Ok(members.find_one(filter, None).await?)
    }

    /// Bump the in-memory last-seen time, returning the new timestamp so
    /// the caller can persist the same value.
    pub fn touch(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.member.last_seen = now;
        now
    }

    /// Check the member holds at least the given rank; no mutation may
    /// happen before this passes.
    pub fn require_role(&self, required: Role) -> Result<()> {
        if self.role >= required {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "This action requires {required} rank"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_with_role(role: Role) -> Member {
        Member {
            id: Id::new(),
            member: MemberCore {
                email: "raider@example.com".to_string(),
                discord_id: "180339587431219201".to_string(),
                role,
                last_seen: Utc::now(),
            },
        }
    }

    #[test]
    fn pending_may_not_vote() {
        let member = member_with_role(Role::Pending);
        assert!(matches!(
            member.require_role(Role::Member),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn member_may_vote_but_not_annotate() {
        let member = member_with_role(Role::Member);
        assert!(member.require_role(Role::Member).is_ok());
        assert!(member.require_role(Role::Officer).is_err());
    }

    #[test]
    fn officer_may_annotate_but_not_decide() {
        let officer = member_with_role(Role::Officer);
        assert!(officer.require_role(Role::Officer).is_ok());
        assert!(matches!(
            officer.require_role(Role::Gm),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn touch_bumps_last_seen() {
        let mut member = member_with_role(Role::Member);
        let before = member.last_seen;
        let now = member.touch();
        assert_eq!(member.last_seen, now);
        assert!(now >= before);
    }

    #[test]
    fn gm_may_do_everything() {
        let gm = member_with_role(Role::Gm);
        for required in [Role::Pending, Role::Member, Role::Officer, Role::Gm] {
            assert!(gm.require_role(required).is_ok());
        }
    }
}
