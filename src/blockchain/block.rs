use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::GENESIS_PREV_HASH;
use crate::transaction::TransactionRecord;

/// A single block in the chain holding an ordered batch of transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub previous_hash: String,
    pub nonce: u64,   // Proof-of-Work nonce
    pub hash: String, // Cached hash of the block
    pub transactions: Vec<TransactionRecord>,
}

impl Block {
    /// Create the genesis block: index 0, empty transaction list, zero
    /// previous hash, mined at `difficulty`.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self {
            index: 0,
            timestamp: Utc::now().timestamp(),
            previous_hash: GENESIS_PREV_HASH.to_string(),
            nonce: 0,
            hash: String::new(),
            transactions: Vec::new(),
        };
        block.mine(difficulty);
        block
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<TransactionRecord>) -> Self {
        Self::new_with_timestamp(index, previous_hash, transactions, Utc::now().timestamp())
    }

    /// Same as `new` but with a fixed timestamp (deterministic templates).
    pub fn new_with_timestamp(
        index: u64,
        previous_hash: String,
        transactions: Vec<TransactionRecord>,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: String::new(),
            transactions,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Compute the SHA-256 hash of this block from its fields (excluding
    /// the `hash` field itself). Transactions are serialized as JSON and
    /// included in the preimage; the preimage layout is fixed once and is
    /// load-bearing for hash reproducibility across the whole chain.
    pub fn compute_hash(&self) -> String {
        let txs_json = serde_json::to_string(&self.transactions).expect("serialize txs");
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.index, self.timestamp, self.previous_hash, self.nonce, txs_json
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash starting
    /// with `difficulty` leading zeros (in hex). This is the only unbounded
    /// loop in the crate; the parallel search in the miner cancels
    /// cooperatively instead of calling this.
    pub fn mine(&mut self, difficulty: u32) {
        let target_prefix = "0".repeat(difficulty as usize);
        loop {
            self.hash = self.compute_hash();
            if self.hash.starts_with(&target_prefix) {
                break;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// True iff the stored hash has at least `difficulty` leading zero hex
    /// nibbles. Does not re-check hash integrity.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash
            .chars()
            .take(difficulty as usize)
            .all(|c| c == '0')
    }

    /// Validate that the block's cached `hash` matches its content and
    /// satisfies the PoW difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash == self.compute_hash() && self.meets_difficulty(difficulty)
    }
}
