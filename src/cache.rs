//! In-memory payment plan cache with bounded TTL
//!
//! Built once per process and handed to whichever service needs it; there is
//! no process-wide cache state in this crate.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::repository::StoredInstallment;
use crate::types::LoanId;

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const DEFAULT_CAPACITY: u64 = 256;

/// plan cache keyed by loan id
pub struct PlanCache {
    entries: Cache<LoanId, Arc<Vec<StoredInstallment>>>,
}

impl PlanCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    pub fn get(&self, loan_id: &LoanId) -> Option<Arc<Vec<StoredInstallment>>> {
        self.entries.get(loan_id)
    }

    pub fn insert(&self, loan_id: LoanId, installments: Vec<StoredInstallment>) {
        self.entries.insert(loan_id, Arc::new(installments));
    }

    pub fn invalidate(&self, loan_id: &LoanId) {
        self.entries.invalidate(loan_id);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
