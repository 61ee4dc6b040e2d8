use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("legend_cache/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Transport)
}
