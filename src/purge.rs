use std::sync::Arc;

use crate::error::CacheError;
use crate::store::CacheStore;

#[derive(Clone)]
pub struct PurgeService {
    store: Arc<CacheStore>,
}

impl PurgeService {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    pub fn remove(&self, player: &str, legend: &str) -> Result<(), CacheError> {
        self.store.delete(player, legend)
    }
}
