use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::FetchError;
use crate::payload::{PlayerPayload, parse_player_payload};
use crate::provider::StatsProvider;

/// Serves a bridge-shaped JSON file instead of the network. The requested player and
/// platform are ignored.
pub struct FixtureProvider {
    path: PathBuf,
}

impl FixtureProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsProvider for FixtureProvider {
    fn fetch_player_stats(
        &self,
        player: &str,
        _platform: &str,
    ) -> Result<PlayerPayload, FetchError> {
        debug!(player, path = %self.path.display(), "serving fixture payload");
        let raw = fs::read_to_string(&self.path).map_err(|source| FetchError::Fixture {
            path: self.path.display().to_string(),
            source,
        })?;
        parse_player_payload(&raw)
    }
}
