use mongodb::bson::{doc, DateTime as BsonDateTime};
use rocket::{http::CookieJar, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{AuthToken, MemberResponse, AUTH_TOKEN_COOKIE},
        db::Member,
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_me, logout]
}

/// The calling member's own record, with their current (server-side) role.
/// Bumps their last-seen timestamp; the response carries the bumped value.
#[get("/auth/me")]
async fn get_me(token: AuthToken, members: Coll<Member>) -> Result<Json<MemberResponse>> {
    let mut member = Member::lookup(&members, token.id).await?;
    let now = member.touch();
    let update = doc! {
        "$set": {
            "last_seen": BsonDateTime::from_chrono(now),
        }
    };
    members.update_one(member.id.as_doc(), update, None).await?;
    Ok(Json(member.into()))
}

/// End the session by clearing the token cookie.
#[delete("/auth")]
fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(AUTH_TOKEN_COOKIE);
}
