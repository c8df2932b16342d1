use rocket::Route;

mod auth;
mod candidates;
mod interactions;
mod notes;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(candidates::routes());
    routes.extend(votes::routes());
    routes.extend(notes::routes());
    routes.extend(auth::routes());
    routes.extend(interactions::routes());
    routes
}
