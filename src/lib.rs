pub mod aggregate;
pub mod config;
pub mod error;
pub mod fake_provider;
pub mod http_client;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod payload;
pub mod provider;
pub mod purge;
pub mod query;
pub mod store;
pub mod task;

pub use error::{CacheError, FetchError};
pub use ingest::{IngestionOrchestrator, RunResult};
pub use model::{LegendStat, LegendTotals, StatKey, StatReading, UpsertOutcome};
pub use provider::StatsProvider;
pub use purge::PurgeService;
pub use query::QueryService;
pub use store::CacheStore;
