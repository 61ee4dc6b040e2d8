use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{info, warn};

use crate::aggregate::aggregate_with_skips;
use crate::error::CacheError;
use crate::model::LegendTotals;
use crate::provider::StatsProvider;
use crate::store::CacheStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub player: String,
    pub legends_processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped_entries: usize,
}

pub struct IngestionOrchestrator<P> {
    provider: P,
    store: Arc<CacheStore>,
    platform: String,
    inflight: Arc<Mutex<HashSet<String>>>,
}

impl<P: StatsProvider> IngestionOrchestrator<P> {
    pub fn new(provider: P, store: Arc<CacheStore>, platform: impl Into<String>) -> Self {
        Self {
            provider,
            store,
            platform: platform.into(),
            inflight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn run(&self, player: &str) -> Result<RunResult, CacheError> {
        self.run_cancellable(player, &AtomicBool::new(false))
    }

    pub fn run_cancellable(
        &self,
        player: &str,
        cancel: &AtomicBool,
    ) -> Result<RunResult, CacheError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(CacheError::BlankPlayer);
        }
        let _guard = InflightGuard::acquire(&self.inflight, player)?;
        let started = Instant::now();
        info!(player, platform = %self.platform, "starting ingestion run");

        check_cancelled(cancel, player)?;
        let payload = self
            .provider
            .fetch_player_stats(player, &self.platform)
            .inspect_err(|err| warn!(player, error = %err, "stats fetch failed"))?;
        check_cancelled(cancel, player)?;

        if payload.legends.is_empty() {
            warn!(player, "stats payload has no legends");
            return Err(CacheError::EmptyPayload {
                player: player.to_string(),
            });
        }

        let mut skipped_entries = 0usize;
        let aggregated: Vec<(&str, LegendTotals)> = payload
            .legends
            .iter()
            .map(|(name, legend)| {
                let (totals, skips) = aggregate_with_skips(legend.data.as_deref());
                skipped_entries += skips.len();
                (name.as_str(), totals)
            })
            .collect();

        let outcome = self.store.write_batch(|batch| {
            let mut processed = 0usize;
            for (legend, totals) in &aggregated {
                batch.upsert(player, legend, *totals)?;
                processed += 1;
            }
            check_cancelled(cancel, player)?;
            Ok(RunResult {
                player: player.to_string(),
                legends_processed: processed,
                inserted: batch.inserted(),
                updated: batch.updated(),
                skipped_entries,
            })
        });

        match &outcome {
            Ok(result) => info!(
                player,
                legends = result.legends_processed,
                inserted = result.inserted,
                updated = result.updated,
                skipped_entries = result.skipped_entries,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "ingestion run committed"
            ),
            Err(err) => warn!(player, error = %err, "ingestion run rolled back"),
        }
        outcome
    }
}

fn check_cancelled(cancel: &AtomicBool, player: &str) -> Result<(), CacheError> {
    if cancel.load(Ordering::SeqCst) {
        return Err(CacheError::Cancelled {
            player: player.to_string(),
        });
    }
    Ok(())
}

struct InflightGuard {
    inflight: Arc<Mutex<HashSet<String>>>,
    player: String,
}

impl InflightGuard {
    fn acquire(inflight: &Arc<Mutex<HashSet<String>>>, player: &str) -> Result<Self, CacheError> {
        let mut set = inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(player.to_string()) {
            return Err(CacheError::RunInProgress {
                player: player.to_string(),
            });
        }
        Ok(Self {
            inflight: Arc::clone(inflight),
            player: player.to_string(),
        })
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut set = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        set.remove(&self.player);
    }
}
