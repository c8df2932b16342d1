use std::time::Duration as StdDuration;

use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::analytics::AnalyticsClient;
use crate::discord::{InteractionVerifier, Notifier};
use crate::model::mongodb::ensure_indexes_exist;

/// Timeout applied to every call to an external collaborator, so a slow
/// Discord or analytics API can never hold a request open indefinitely.
const EXTERNAL_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign session JWTs. Shared with the auth provider
    /// that mints them.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures the required indexes exist, and places both a `Client` and a
/// `Database` into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // The unique ballot index is the sole guard against duplicate votes,
        // so refuse to start without it.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "guildhall".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Configuration for the Discord connection.
#[derive(Deserialize)]
struct DiscordConfig {
    // non-secrets
    discord_channel_id: String,
    discord_public_key: String,
    // secrets
    discord_bot_token: String,
}

/// A fairing that loads the Discord config and places a [`Notifier`] and an
/// [`InteractionVerifier`] into managed state.
pub struct DiscordFairing;

#[rocket::async_trait]
impl Fairing for DiscordFairing {
    fn info(&self) -> Info {
        Info {
            name: "Discord",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<DiscordConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load Discord config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let verifier = match InteractionVerifier::new(&config.discord_public_key) {
            Ok(verifier) => verifier,
            Err(e) => {
                error!("Invalid Discord public key: {e}");
                return Err(rocket);
            }
        };

        let notifier = match Notifier::new(
            config.discord_bot_token,
            config.discord_channel_id,
            EXTERNAL_TIMEOUT,
        ) {
            Ok(notifier) => notifier,
            Err(e) => {
                error!("Failed to construct Discord client: {e}");
                return Err(rocket);
            }
        };
        info!("Loaded Discord config");

        rocket = rocket.manage(verifier).manage(notifier);
        Ok(rocket)
    }
}

/// Configuration for the combat-log analytics API.
#[derive(Deserialize)]
struct AnalyticsConfig {
    // non-secrets
    analytics_url: String,
    // secrets
    analytics_token: String,
}

/// A fairing that loads the analytics config and places an
/// [`AnalyticsClient`] into managed state.
pub struct AnalyticsFairing;

#[rocket::async_trait]
impl Fairing for AnalyticsFairing {
    fn info(&self) -> Info {
        Info {
            name: "Analytics",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<AnalyticsConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load analytics config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let client = match AnalyticsClient::new(
            config.analytics_url,
            config.analytics_token,
            EXTERNAL_TIMEOUT,
        ) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to construct analytics client: {e}");
                return Err(rocket);
            }
        };
        info!("Loaded analytics config");

        rocket = rocket.manage(client);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{
        providers::{Format, Toml},
        Figment, Profile,
    };

    use super::*;

    fn profile_figment(profile: &str) -> Figment {
        Figment::from(Toml::file("Rocket.toml").nested()).select(Profile::new(profile))
    }

    /// Collaborator credentials must come from the environment in release
    /// builds; a deployment that forgets them has to abort at ignition
    /// rather than igniting with placeholder values.
    #[test]
    fn release_profile_ships_no_collaborator_credentials() {
        let figment = profile_figment("release");
        assert!(figment.extract::<DiscordConfig>().is_err());
        assert!(figment.extract::<DbConfig>().is_err());
        assert!(figment.extract::<AnalyticsConfig>().is_err());
    }

    #[test]
    fn debug_profile_supplies_dev_credentials() {
        let figment = profile_figment("debug");
        assert!(figment.extract::<DiscordConfig>().is_ok());
        assert!(figment.extract::<DbConfig>().is_ok());
        assert!(figment.extract::<AnalyticsConfig>().is_ok());
    }
}
