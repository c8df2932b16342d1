#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod analytics;
pub mod api;
pub mod config;
pub mod discord;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server: all routes plus the fairings that load config,
/// connect to the database, and construct the external-service clients.
/// Any missing configuration aborts ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(config::DiscordFairing)
        .attach(config::AnalyticsFairing)
        .attach(logging::LoggerFairing)
}
