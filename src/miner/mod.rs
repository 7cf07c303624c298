use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info, warn};

use crate::blockchain::Block;
use crate::error::{ConsensusError, MiningError};
use crate::node::Node;
use crate::transaction::TransactionRecord;

/// How many nonces a worker grinds between cancellation checks.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Drives the Proof-of-Work search: composes candidate blocks from pool
/// contents and scans the nonce space across worker threads. Runs until it
/// seals a block or the owning process cancels it via the stop handle.
pub struct Miner<'a> {
    node: &'a Node,
    stop: Arc<AtomicBool>,
}

impl<'a> Miner<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the owning process to cancel an in-flight search.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Compose a candidate from the pool (reward first), search the nonce
    /// space, submit. Whenever the tip moves mid-search or the submission
    /// comes back stale, the candidate is discarded and the search restarts
    /// against the new tip; the same previous_hash is never retried.
    pub fn mine_next_block(&self, miner_address: &str) -> Result<Block, MiningError> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Err(MiningError::Cancelled);
            }

            let (index, previous_hash, difficulty, epoch) = self.node.mining_snapshot();
            let config = self.node.config();

            let pending = self.node.pending_transactions(config.max_block_size);
            let mut transactions = Vec::with_capacity(1 + pending.len());
            transactions.push(TransactionRecord::reward(miner_address, config.mining_reward));
            transactions.extend(pending);

            let template = Block::new(index, previous_hash, transactions);
            debug!(
                "MINER - searching block #{index} (diff={difficulty}, txs={})",
                template.transactions.len()
            );

            let Some(block) = self.search(template, difficulty, epoch, config.miner_threads)
            else {
                if self.stop.load(Ordering::SeqCst) {
                    return Err(MiningError::Cancelled);
                }
                debug!("MINER - tip moved during search, restarting");
                continue;
            };

            match self.node.submit_block(block.clone()) {
                Ok(()) => {
                    info!(
                        "MINER - sealed block #{} (hash={}, nonce={})",
                        block.index, block.hash, block.nonce
                    );
                    return Ok(block);
                }
                Err(ConsensusError::StaleTip | ConsensusError::IndexMismatch { .. }) => {
                    warn!(
                        "MINER - block #{} went stale before submission, restarting",
                        block.index
                    );
                    continue;
                }
                Err(err) => {
                    // A candidate we mined ourselves can only fail its own
                    // hash or difficulty check through corrupted state.
                    panic!("mined candidate failed validation: {err}");
                }
            }
        }
    }

    /// Parallel nonce scan. Worker `w` of `t` tries nonces w, w+t, w+2t, …
    /// The first worker to meet the target wins and flips the shared flag;
    /// siblings notice at their next poll and stop cooperatively. Returns
    /// None when cancelled (stop flag or tip epoch moved).
    fn search(&self, template: Block, difficulty: u32, epoch: u64, threads: usize) -> Option<Block> {
        let threads = threads.max(1) as u64;
        let target_prefix = "0".repeat(difficulty as usize);
        let found = AtomicBool::new(false);
        let winner: Mutex<Option<Block>> = Mutex::new(None);

        thread::scope(|scope| {
            for worker in 0..threads {
                let template = template.clone();
                let found = &found;
                let winner = &winner;
                let target_prefix = target_prefix.as_str();
                scope.spawn(move || {
                    let mut block = template;
                    block.nonce = worker;
                    let mut since_poll = 0u64;
                    loop {
                        block.hash = block.compute_hash();
                        if block.hash.starts_with(target_prefix) {
                            if !found.swap(true, Ordering::SeqCst) {
                                *winner.lock().expect("mutex poisoned") = Some(block);
                            }
                            return;
                        }
                        block.nonce = block.nonce.wrapping_add(threads);

                        since_poll += 1;
                        if since_poll >= CANCEL_POLL_INTERVAL {
                            since_poll = 0;
                            if found.load(Ordering::SeqCst)
                                || self.stop.load(Ordering::SeqCst)
                                || self.node.tip_epoch() != epoch
                            {
                                return;
                            }
                        }
                    }
                });
            }
        });

        let block = winner.lock().expect("mutex poisoned").take();
        block
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::Miner;
    use crate::blockchain::Block;
    use crate::config::NodeConfig;
    use crate::error::MiningError;
    use crate::node::Node;
    use crate::transaction::TransactionRecord;
    use crate::wallet::generate_keypair_hex;

    fn test_node(difficulty: u32) -> Arc<Node> {
        Arc::new(Node::new(NodeConfig {
            initial_difficulty: difficulty,
            miner_threads: 2,
            ..NodeConfig::default()
        }))
    }

    #[test]
    fn mines_reward_plus_pending_transactions() {
        let node = test_node(1);
        let (sk, sender) = generate_keypair_hex();
        let mut tx = TransactionRecord::new(sender, "recipient", 3);
        tx.sign(&sk).expect("sign");
        node.submit_transaction(tx.clone()).expect("admission");

        let miner = Miner::new(&node);
        let block = miner.mine_next_block("miner-address").expect("mine");

        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 2);
        assert!(block.transactions[0].is_reward());
        assert_eq!(block.transactions[1], tx);
        assert_eq!(node.get_chain().len(), 2);
    }

    #[test]
    fn cancellation_surfaces_as_mining_error() {
        let node = test_node(1);
        let miner = Miner::new(&node);
        miner.stop_handle().store(true, Ordering::SeqCst);
        assert_eq!(
            miner.mine_next_block("miner-address"),
            Err(MiningError::Cancelled)
        );
    }

    #[test]
    fn search_stops_when_the_tip_epoch_moves() {
        // Difficulty 8 is effectively unreachable within one poll window,
        // so a stale epoch is the only way the workers can exit.
        let node = test_node(1);
        let miner = Miner::new(&node);
        let (index, previous_hash, _, epoch) = node.mining_snapshot();
        let template = Block::new(index, previous_hash, vec![]);

        let result = miner.search(template, 8, epoch.wrapping_add(1), 2);
        assert!(result.is_none());
    }

    #[test]
    fn search_stops_on_the_stop_flag() {
        let node = test_node(1);
        let miner = Miner::new(&node);
        miner.stop_handle().store(true, Ordering::SeqCst);
        let (index, previous_hash, _, epoch) = node.mining_snapshot();
        let template = Block::new(index, previous_hash, vec![]);

        assert!(miner.search(template, 8, epoch, 2).is_none());
    }

    #[test]
    fn restart_discards_a_stale_previous_hash() {
        // A peer chain lands while our pool holds a tx; the miner must build
        // on the adopted tip, not the original genesis.
        let node = test_node(1);
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
        assert!(node.accept_remote_chain(peer_chain));

        let miner = Miner::new(&node);
        let block = miner.mine_next_block("miner-address").expect("mine");
        assert_eq!(block.index, 3);
        assert_eq!(block.previous_hash, node.get_chain()[2].hash);
    }
}
