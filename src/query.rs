use std::sync::Arc;

use crate::error::CacheError;
use crate::model::{LegendStat, StatKey, StatReading};
use crate::store::CacheStore;

#[derive(Clone)]
pub struct QueryService {
    store: Arc<CacheStore>,
}

impl QueryService {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    pub fn get_stat(
        &self,
        player: &str,
        legend: &str,
        stat_key: &str,
    ) -> Result<StatReading, CacheError> {
        let key = stat_key.parse::<StatKey>()?;
        let row = self.store.lookup(player, legend)?;
        Ok(StatReading {
            value: row.stat(key),
            key,
            player_name: row.player_name,
            legend_name: row.legend_name,
            recorded_at: row.recorded_at,
        })
    }

    pub fn legend(&self, player: &str, legend: &str) -> Result<LegendStat, CacheError> {
        self.store.lookup(player, legend)
    }

    pub fn legends(&self, player: &str) -> Result<Vec<LegendStat>, CacheError> {
        self.store.list_player(player)
    }
}
