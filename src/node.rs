use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::Serialize;

use crate::blockchain::{Block, Ledger};
use crate::config::NodeConfig;
use crate::error::{ConsensusError, MiningError, PoolError};
use crate::miner::Miner;
use crate::transaction::{TransactionPool, TransactionRecord};

/// Single-node facade over the ledger core. Owns the locks and the tip
/// epoch; collaborators (API, sync, miners) only go through these methods.
///
/// Lock order, where both are needed: ledger before pool. The pool lock is
/// never held across a ledger mutation, so pool traffic never waits on a
/// Proof-of-Work search.
pub struct Node {
    ledger: Mutex<Ledger>,
    pool: Mutex<TransactionPool>,
    tip_epoch: AtomicU64,
    config: NodeConfig,
}

/// Lightweight snapshot for logging and observability.
#[derive(Debug, Serialize)]
pub struct NodeStats {
    pub height: usize,
    pub difficulty: u32,
    pub pool_size: usize,
    pub last_interval_secs: Option<i64>,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new(&config)),
            pool: Mutex::new(TransactionPool::new(config.max_pool_size)),
            tip_epoch: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Bumped after every successful chain mutation; miners poll this to
    /// notice the tip moving underneath their nonce search.
    pub fn tip_epoch(&self) -> u64 {
        self.tip_epoch.load(Ordering::SeqCst)
    }

    fn bump_tip_epoch(&self) {
        self.tip_epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Admit a transaction into the pending pool.
    pub fn submit_transaction(&self, tx: TransactionRecord) -> Result<(), PoolError> {
        let mut pool = self.pool.lock().expect("mutex poisoned");
        pool.add(tx)
    }

    /// Snapshot of (next index, tip hash, difficulty, tip epoch) for the
    /// miner. Read under the ledger lock so the epoch names exactly this tip.
    pub fn mining_snapshot(&self) -> (u64, String, u32, u64) {
        let bc = self.ledger.lock().expect("mutex poisoned");
        (
            bc.len() as u64,
            bc.get_tip().hash.clone(),
            bc.difficulty(),
            self.tip_epoch(),
        )
    }

    /// Up to `limit` oldest pool entries, left in place until eviction.
    pub fn pending_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        self.pool.lock().expect("mutex poisoned").drain(limit)
    }

    /// Validate and append a mined block, then evict its transactions from
    /// the pool. Tip-check-then-append happens atomically inside the ledger
    /// lock; the pool is cleaned afterwards under its own lock.
    pub fn submit_block(&self, block: Block) -> Result<(), ConsensusError> {
        let committed = block.transactions.clone();
        {
            let mut bc = self.ledger.lock().expect("mutex poisoned");
            bc.add_block(block)?;
        }
        self.bump_tip_epoch();

        let mut pool = self.pool.lock().expect("mutex poisoned");
        pool.evict(&committed);
        Ok(())
    }

    /// Entry point for a sync collaborator that already fetched a peer's
    /// full chain. Adoption bumps the tip epoch so in-flight searches
    /// restart against the new tip.
    pub fn accept_remote_chain(&self, candidate: Vec<Block>) -> bool {
        let replaced = {
            let mut bc = self.ledger.lock().expect("mutex poisoned");
            bc.replace_chain(candidate)
        };
        if replaced {
            self.bump_tip_epoch();
        }
        replaced
    }

    /// Mine one block on the calling thread, crediting `miner_address`.
    /// Long-running owners construct a [`Miner`] directly to keep a
    /// cancellation handle.
    pub fn mine(&self, miner_address: &str) -> Result<Block, MiningError> {
        Miner::new(self).mine_next_block(miner_address)
    }

    /// Cloned view of the committed chain.
    pub fn get_chain(&self) -> Vec<Block> {
        self.ledger.lock().expect("mutex poisoned").chain.clone()
    }

    /// Committed balance plus pending pool deltas, computed against one
    /// consistent snapshot (both locks held, in the fixed order).
    pub fn get_balance(&self, address: &str) -> i64 {
        let bc = self.ledger.lock().expect("mutex poisoned");
        let mut balance = bc.get_balance(address);

        let pool = self.pool.lock().expect("mutex poisoned");
        for tx in pool.iter() {
            if tx.recipient == address {
                balance += tx.amount as i64;
            }
            if tx.sender == address {
                balance -= tx.amount as i64;
            }
        }
        debug!("BALANCE - {address} = {balance}");
        balance
    }

    pub fn stats(&self) -> NodeStats {
        let (height, difficulty, last_interval_secs) = {
            let bc = self.ledger.lock().expect("mutex poisoned");
            let height = bc.len();
            let last = if height >= 2 {
                let newer = &bc.chain[height - 1];
                let older = &bc.chain[height - 2];
                Some((newer.timestamp - older.timestamp).max(0))
            } else {
                None
            };
            (height, bc.difficulty(), last)
        };
        let pool_size = self.pool.lock().expect("mutex poisoned").len();
        NodeStats {
            height,
            difficulty,
            pool_size,
            last_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::Node;
    use crate::blockchain::Block;
    use crate::config::NodeConfig;
    use crate::error::PoolError;
    use crate::transaction::TransactionRecord;
    use crate::wallet::generate_keypair_hex;

    fn test_config() -> NodeConfig {
        NodeConfig {
            initial_difficulty: 1,
            miner_threads: 2,
            ..NodeConfig::default()
        }
    }

    fn signed_transfer(sk: &str, sender: &str, recipient: &str, amount: u64) -> TransactionRecord {
        let mut tx = TransactionRecord::new(sender, recipient, amount);
        tx.sign(sk).expect("sign");
        tx
    }

    #[test]
    fn fresh_node_has_no_balances() {
        let node = Node::new(test_config());
        assert_eq!(node.get_chain().len(), 1);
        assert_eq!(node.get_balance("anyone"), 0);
    }

    #[test]
    fn submit_then_mine_commits_the_transfer() {
        let node = Arc::new(Node::new(test_config()));
        let (sk, sender) = generate_keypair_hex();
        let (_, recipient) = generate_keypair_hex();

        node.submit_transaction(signed_transfer(&sk, &sender, &recipient, 5))
            .expect("admission");
        assert_eq!(node.stats().pool_size, 1);
        // Pending entries already count towards balances
        assert_eq!(node.get_balance(&recipient), 5);

        let block = node.mine("miner-address").expect("mine");
        assert_eq!(block.index, 1);
        assert!(block.transactions[0].is_reward(), "reward comes first");

        assert_eq!(node.get_chain().len(), 2);
        assert_eq!(node.stats().pool_size, 0, "committed txs are evicted");
        assert_eq!(node.get_balance(&recipient), 5);
        assert_eq!(
            node.get_balance("miner-address"),
            node.config().mining_reward as i64
        );
    }

    #[test]
    fn unsigned_submission_is_rejected() {
        let node = Node::new(test_config());
        let tx = TransactionRecord::new("somebody", "else", 5);
        assert_eq!(node.submit_transaction(tx), Err(PoolError::Signature));
    }

    #[test]
    fn remote_chain_adoption_follows_longest_valid() {
        let node = Node::new(test_config());

        // A peer mined two blocks on top of the same genesis
        let mut peer_chain = node.get_chain();
        for _ in 0..2 {
            let mut block = Block::new(
                peer_chain.len() as u64,
                peer_chain.last().unwrap().hash.clone(),
                vec![TransactionRecord::reward("peer-miner", 10)],
            );
            block.mine(1);
            peer_chain.push(block);
        }

        let epoch_before = node.tip_epoch();
        assert!(node.accept_remote_chain(peer_chain.clone()));
        assert_eq!(node.get_chain().len(), 3);
        assert!(node.tip_epoch() > epoch_before, "adoption restarts miners");

        // Same chain again: no longer strictly longer
        assert!(!node.accept_remote_chain(peer_chain));
    }

    #[test]
    fn tampered_remote_chain_is_rejected() {
        let node = Node::new(test_config());
        let mut peer_chain = node.get_chain();
        for _ in 0..2 {
            let mut block = Block::new(
                peer_chain.len() as u64,
                peer_chain.last().unwrap().hash.clone(),
                vec![TransactionRecord::reward("peer-miner", 10)],
            );
            block.mine(1);
            peer_chain.push(block);
        }
        peer_chain[1].transactions[0].amount = 1_000_000;

        assert!(!node.accept_remote_chain(peer_chain));
        assert_eq!(node.get_chain().len(), 1);
    }

    #[test]
    fn mining_runs_concurrently_with_submissions() {
        let node = Arc::new(Node::new(test_config()));
        let miner_node = Arc::clone(&node);
        let miner = thread::spawn(move || {
            for _ in 0..3 {
                miner_node.mine("miner-address").expect("mine");
            }
        });

        let (sk, sender) = generate_keypair_hex();
        for i in 0..10 {
            node.submit_transaction(signed_transfer(&sk, &sender, "recipient", i + 1))
                .expect("admission");
        }
        miner.join().expect("miner thread");

        assert_eq!(node.get_chain().len(), 4);
        for i in 1..node.get_chain().len() {
            let chain = node.get_chain();
            assert_eq!(chain[i].previous_hash, chain[i - 1].hash);
        }
    }
}
