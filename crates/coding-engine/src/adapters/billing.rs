//! # In-Memory Billing Gateway
//!
//! Stand-in for the billing subsystem. Mints deterministic bill references,
//! remembers which record got which bill so repeat syncs are idempotent,
//! and can be flipped offline to exercise the retry path.

use crate::domain::{CodingError, CodingRecord};
use crate::ports::outbound::BillingGateway;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BillRef, RecordId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

struct BillingInner {
    refs: RwLock<HashMap<RecordId, BillRef>>,
    next_seq: AtomicU64,
    available: AtomicBool,
}

/// In-memory billing gateway. Clones share state.
#[derive(Clone)]
pub struct InMemoryBillingGateway {
    inner: Arc<BillingInner>,
}

impl InMemoryBillingGateway {
    /// Create an online gateway with no bills yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BillingInner {
                refs: RwLock::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Flip the gateway online/offline.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Number of bills created so far.
    pub fn synced_count(&self) -> usize {
        self.inner.refs.read().len()
    }
}

impl Default for InMemoryBillingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingGateway for InMemoryBillingGateway {
    async fn sync_to_billing(&self, record: &CodingRecord) -> Result<BillRef, CodingError> {
        if !self.inner.available.load(Ordering::SeqCst) {
            warn!(record = %record.coding_number, "billing gateway offline, sync refused");
            return Err(CodingError::BillingUnavailable {
                reason: "billing gateway offline".to_string(),
            });
        }

        if let Some(existing) = self.inner.refs.read().get(&record.id) {
            return Ok(existing.clone());
        }

        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let bill = BillRef::new(format!("BILL-{seq:06}"));
        self.inner.refs.write().insert(record.id, bill.clone());
        info!(record = %record.coding_number, bill = %bill, "record synced to billing");
        Ok(bill)
    }
}
