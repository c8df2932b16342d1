//! The combat-log analytics collaborator: parse a profile URL into a
//! character reference, query the GraphQL API, and bracket the result into
//! a cacheable snapshot.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::common::PerformanceSnapshot;

const RANKINGS_QUERY: &str = "\
query ($name: String!, $serverSlug: String!, $serverRegion: String!) {
  characterData {
    character(name: $name, serverSlug: $serverSlug, serverRegion: $serverRegion) {
      zoneRankings
    }
  }
}";

/// A character on the analytics site, keyed by region + realm + name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRef {
    pub region: String,
    pub realm: String,
    pub name: String,
}

impl CharacterRef {
    /// Extract the character triple from a user-supplied profile URL of
    /// the shape `https://<host>/character/<region>/<realm>/<name>`.
    pub fn from_profile_url(url: &str) -> Result<Self> {
        let malformed = || {
            Error::BadRequest(format!(
                "Unrecognised combat-log profile URL: {url}"
            ))
        };

        // Drop any query string or fragment before splitting the path.
        let path = url
            .split(['?', '#'])
            .next()
            .expect("split always yields at least one part");
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        segments
            .by_ref()
            .find(|segment| *segment == "character")
            .ok_or_else(malformed)?;
        let region = segments.next().ok_or_else(malformed)?;
        let realm = segments.next().ok_or_else(malformed)?;
        let name = segments.next().ok_or_else(malformed)?;

        Ok(Self {
            region: region.to_lowercase(),
            realm: realm.to_lowercase(),
            name: name.to_string(),
        })
    }
}

/// Read-only client for the analytics GraphQL API.
pub struct AnalyticsClient {
    http: Client,
    url: String,
    token: String,
}

impl AnalyticsClient {
    pub fn new(
        url: String,
        token: String,
        timeout: Duration,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url, token })
    }

    /// Fetch a fresh performance snapshot for the given character.
    ///
    /// Any failure maps to a user-facing error string; callers decide
    /// whether the lookup is primary (refresh) or best-effort (submission).
    pub async fn fetch_snapshot(&self, character: &CharacterRef) -> Result<PerformanceSnapshot> {
        let request = GraphQlRequest {
            query: RANKINGS_QUERY,
            variables: Variables {
                name: &character.name,
                server_slug: &character.realm,
                server_region: &character.region,
            },
        };
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::ExternalService(format!("Analytics API unreachable: {err}")))?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "Analytics API returned {}",
                response.status()
            )));
        }
        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|err| Error::ExternalService(format!("Invalid analytics response: {err}")))?;

        if let Some(errors) = body.errors {
            let message = errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::ExternalService(format!(
                "Analytics lookup failed: {message}"
            )));
        }

        let rankings = body
            .data
            .and_then(|d| d.character_data)
            .and_then(|c| c.character)
            .map(|c| c.zone_rankings)
            .ok_or_else(|| {
                Error::ExternalService(format!(
                    "No analytics profile found for {} on {}-{}",
                    character.name, character.region, character.realm
                ))
            })?;

        Ok(PerformanceSnapshot::new(
            rankings.best_performance_average.unwrap_or(0.0),
            rankings.total_kills.unwrap_or(0),
        ))
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a> {
    name: &'a str,
    server_slug: &'a str,
    server_region: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    #[serde(default)]
    character_data: Option<CharacterData>,
}

#[derive(Debug, Deserialize)]
struct CharacterData {
    #[serde(default)]
    character: Option<Character>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Character {
    zone_rankings: ZoneRankings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneRankings {
    #[serde(default)]
    best_performance_average: Option<f64>,
    #[serde(default)]
    total_kills: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_standard_profile_url() {
        let character =
            CharacterRef::from_profile_url("https://www.warcraftlogs.com/character/eu/Draenor/Thrall")
                .unwrap();
        assert_eq!(character.region, "eu");
        assert_eq!(character.realm, "draenor");
        assert_eq!(character.name, "Thrall");
    }

    #[test]
    fn ignores_query_strings_and_trailing_segments() {
        let character = CharacterRef::from_profile_url(
            "https://logs.example.com/character/us/area-52/Jaina?zone=44#boss-trash",
        )
        .unwrap();
        assert_eq!(character.region, "us");
        assert_eq!(character.realm, "area-52");
        assert_eq!(character.name, "Jaina");
    }

    #[test]
    fn rejects_urls_without_a_character_path() {
        assert!(CharacterRef::from_profile_url("https://example.com/guild/eu/draenor/foo").is_err());
    }

    #[test]
    fn rejects_truncated_urls() {
        assert!(CharacterRef::from_profile_url("https://example.com/character/eu/draenor").is_err());
    }
}
