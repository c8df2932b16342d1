use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{common::Role, db::Member};

use super::id::ApiId;

/// The caller's own member record, as serialized into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub id: ApiId,
    pub email: String,
    pub discord_id: String,
    pub role: Role,
    pub last_seen: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id.into(),
            email: member.member.email,
            discord_id: member.member.discord_id,
            role: member.member.role,
            last_seen: member.member.last_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::model::{db::MemberCore, mongodb::Id};

    use super::*;

    #[test]
    fn response_carries_bumped_last_seen() {
        let mut member = Member {
            id: Id::new(),
            member: MemberCore {
                email: "raider@example.com".to_string(),
                discord_id: "180339587431219201".to_string(),
                role: Role::Member,
                last_seen: Utc::now() - chrono::Duration::days(3),
            },
        };
        let now = member.touch();
        let response = MemberResponse::from(member);
        assert_eq!(response.last_seen, now);
    }
}
