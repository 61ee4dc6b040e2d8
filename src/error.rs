use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("stats provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("stats provider rejected the api key (http {0})")]
    Unauthorized(StatusCode),

    #[error("stats provider returned http {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("stats provider reported an error: {0}")]
    Provider(String),

    #[error("stats payload is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("stats payload has no legends.all map")]
    MissingLegends,

    #[error("no api key configured for the stats provider")]
    MissingApiKey,

    #[error("failed to read fixture payload {path}: {source}")]
    Fixture {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("player name must not be blank")]
    BlankPlayer,

    #[error("stats provider returned no legends for {player}")]
    EmptyPayload { player: String },

    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("no cached stats for {legend} ({player}); run an ingest first")]
    NotFound { player: String, legend: String },

    #[error("invalid stat key {0:?}; expected one of kills, wins, damage")]
    InvalidStatKey(String),

    #[error("an ingestion run for {player} is already in flight")]
    RunInProgress { player: String },

    #[error("ingestion run for {player} was cancelled")]
    Cancelled { player: String },

    #[error("ingestion worker for {player} exited without a result")]
    WorkerLost { player: String },
}

impl CacheError {
    pub fn not_found(player: &str, legend: &str) -> Self {
        CacheError::NotFound {
            player: player.to_string(),
            legend: legend.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}

/// Attaches a short label to sqlite failures, the way `anyhow::Context` does.
pub trait PersistContext<T> {
    fn persist_ctx(self, context: &'static str) -> Result<T, CacheError>;
}

impl<T> PersistContext<T> for Result<T, rusqlite::Error> {
    fn persist_ctx(self, context: &'static str) -> Result<T, CacheError> {
        self.map_err(|source| CacheError::Persistence { context, source })
    }
}
