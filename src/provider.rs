use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::FetchError;
use crate::http_client::http_client;
use crate::payload::{PlayerPayload, parse_player_payload};

pub trait StatsProvider {
    fn fetch_player_stats(
        &self,
        player: &str,
        platform: &str,
    ) -> Result<PlayerPayload, FetchError>;
}

impl<P: StatsProvider + ?Sized> StatsProvider for &P {
    fn fetch_player_stats(
        &self,
        player: &str,
        platform: &str,
    ) -> Result<PlayerPayload, FetchError> {
        (**self).fetch_player_stats(player, platform)
    }
}

impl<P: StatsProvider + ?Sized> StatsProvider for Box<P> {
    fn fetch_player_stats(
        &self,
        player: &str,
        platform: &str,
    ) -> Result<PlayerPayload, FetchError> {
        (**self).fetch_player_stats(player, platform)
    }
}

pub struct BridgeProvider {
    client: Client,
    url: String,
    api_key: String,
}

impl BridgeProvider {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(cfg: &TrackerConfig) -> Result<Self, FetchError> {
        let api_key = cfg.api_key.clone().ok_or(FetchError::MissingApiKey)?;
        let client = http_client(cfg.timeout)?;
        Ok(Self::new(cfg.api_url.clone(), api_key, client))
    }
}

impl StatsProvider for BridgeProvider {
    fn fetch_player_stats(
        &self,
        player: &str,
        platform: &str,
    ) -> Result<PlayerPayload, FetchError> {
        debug!(player, platform, url = %self.url, "requesting player stats");
        let resp = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, &self.api_key)
            .query(&[("player", player), ("platform", platform)])
            .send()?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "stats provider rejected credentials");
            return Err(FetchError::Unauthorized(status));
        }
        let body = resp.text()?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }
        parse_player_payload(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_CHARS).collect();
    out.push_str("...");
    out
}
