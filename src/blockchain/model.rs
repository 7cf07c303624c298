use log::{info, warn};

use super::{Block, DifficultyController, GENESIS_PREV_HASH};
use crate::config::NodeConfig;
use crate::error::ConsensusError;

/// Owns the chain: validates and appends blocks, implements the
/// longest-valid-chain fork-choice rule. The ledger is the sole mutator of
/// the chain; callers serialize access through a single lock (see `Node`).
#[derive(Debug)]
pub struct Ledger {
    pub chain: Vec<Block>,
    difficulty: DifficultyController,
}

impl Ledger {
    /// Initialize with a genesis block mined at the configured initial
    /// difficulty.
    pub fn new(config: &NodeConfig) -> Self {
        let difficulty = DifficultyController::new(
            config.initial_difficulty,
            config.target_block_secs,
            config.adjustment_interval,
        );
        let genesis = Block::genesis(difficulty.current());
        Self {
            chain: vec![genesis],
            difficulty,
        }
    }

    /// Return the last block in the chain.
    pub fn get_tip(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger must always hold at least the genesis block")
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty.current()
    }

    /// Validate `block` against the current tip and difficulty, then append
    /// and run the retarget check. Pool eviction is the caller's job, so
    /// the pool lock is never held inside the ledger lock.
    pub fn add_block(&mut self, block: Block) -> Result<(), ConsensusError> {
        let expected = self.chain.len() as u64;
        if block.index != expected {
            return Err(ConsensusError::IndexMismatch {
                expected,
                got: block.index,
            });
        }
        if block.previous_hash != self.get_tip().hash {
            return Err(ConsensusError::StaleTip);
        }
        if block.hash != block.compute_hash() {
            return Err(ConsensusError::HashMismatch);
        }
        let difficulty = self.difficulty.current();
        if !block.meets_difficulty(difficulty) {
            return Err(ConsensusError::InsufficientWork(difficulty));
        }

        info!(
            "LEDGER - accepted block #{} (hash={}, txs={})",
            block.index,
            block.hash,
            block.transactions.len()
        );
        self.chain.push(block);
        self.difficulty.maybe_retarget(&self.chain);
        Ok(())
    }

    /// Longest-valid-chain rule: adopt `candidate` only if it validates
    /// end-to-end from genesis AND is strictly longer than the local chain.
    /// Ties are not replaced; a failed candidate leaves the ledger
    /// untouched.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.chain.len() {
            warn!(
                "FORK - rejected candidate: not longer ({} <= {})",
                candidate.len(),
                self.chain.len()
            );
            return false;
        }
        if !Self::validate_chain(&candidate, self.difficulty.current()) {
            warn!("FORK - rejected candidate: failed end-to-end validation");
            return false;
        }

        info!(
            "FORK - adopting candidate chain of length {} (was {})",
            candidate.len(),
            self.chain.len()
        );
        self.chain = candidate;
        true
    }

    /// Validate the entire local chain (linkage, hashes, PoW).
    pub fn is_valid_chain(&self) -> bool {
        Self::validate_chain(&self.chain, self.difficulty.current())
    }

    /// Full-chain validation: genesis structure and hash integrity, then
    /// per-block contiguous index, linkage and PoW at `difficulty`. The
    /// genesis proof is not re-checked against `difficulty` because it was
    /// mined at the initial difficulty, which the retarget rule may since
    /// have moved.
    fn validate_chain(chain: &[Block], difficulty: u32) -> bool {
        let genesis = match chain.first() {
            Some(block) => block,
            None => return false,
        };
        if genesis.index != 0
            || genesis.previous_hash != GENESIS_PREV_HASH
            || genesis.hash != genesis.compute_hash()
        {
            return false;
        }

        for i in 1..chain.len() {
            let current = &chain[i];
            let prev = &chain[i - 1];

            if current.index != i as u64 {
                return false;
            }
            if current.previous_hash != prev.hash {
                return false;
            }
            if !current.is_valid(difficulty) {
                return false;
            }
        }

        true
    }

    /// Replay every committed transaction: +amount to the recipient,
    /// -amount from the sender. Recomputed from full history on each call;
    /// pending pool entries are layered on top by `Node::get_balance`.
    pub fn get_balance(&self, address: &str) -> i64 {
        let mut balance: i64 = 0;
        for block in &self.chain {
            for tx in &block.transactions {
                if tx.recipient == address {
                    balance += tx.amount as i64;
                }
                if tx.sender == address {
                    balance -= tx.amount as i64;
                }
            }
        }
        balance
    }
}
