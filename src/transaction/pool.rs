use log::{debug, warn};

use super::TransactionRecord;
use crate::error::PoolError;

/// Bounded admission buffer for unconfirmed transactions. Insertion order
/// is preserved; entries only leave through `evict` when a block commits
/// them, so a failed mining attempt never loses transactions.
#[derive(Debug)]
pub struct TransactionPool {
    entries: Vec<TransactionRecord>,
    max_size: usize,
}

impl TransactionPool {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
        }
    }

    /// Admit a transaction: structural validation, then capacity, then
    /// signature. Rejections are reported, never silently dropped.
    pub fn add(&mut self, tx: TransactionRecord) -> Result<(), PoolError> {
        tx.validate()?;
        if self.entries.len() >= self.max_size {
            warn!("POOL - rejected tx: at capacity ({})", self.max_size);
            return Err(PoolError::Capacity(self.max_size));
        }
        if !tx.verify() {
            warn!("POOL - rejected tx from {}: bad signature", tx.sender);
            return Err(PoolError::Signature);
        }
        debug!(
            "POOL - admitted tx {} -> {} (amount={}); size now {}",
            tx.sender,
            tx.recipient,
            tx.amount,
            self.entries.len() + 1
        );
        self.entries.push(tx);
        Ok(())
    }

    /// Up to `limit` oldest entries, cloned. Nothing is removed here;
    /// removal happens only on block acceptance via `evict`.
    pub fn drain(&self, limit: usize) -> Vec<TransactionRecord> {
        self.entries.iter().take(limit).cloned().collect()
    }

    /// Remove exactly the given transactions (by value).
    pub fn evict(&mut self, committed: &[TransactionRecord]) {
        let before = self.entries.len();
        self.entries.retain(|tx| !committed.contains(tx));
        let after = self.entries.len();
        if before != after {
            debug!("POOL - evicted {} committed txs, {} left", before - after, after);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
