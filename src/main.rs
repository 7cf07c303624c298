use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dotenvy::dotenv;
use log::info;

use ledger_core::config::NodeConfig;
use ledger_core::miner::Miner;
use ledger_core::node::Node;
use ledger_core::wallet;

fn main() {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    println!(
        "⛓️ Starting ledger node (difficulty={}, reward={}, threads={})",
        config.initial_difficulty, config.mining_reward, config.miner_threads
    );

    let node = Arc::new(Node::new(config));
    let (_, miner_address) = wallet::generate_keypair_hex();
    info!("mining to address {miner_address}");

    // Mining runs on its own thread so the ledger stays responsive to
    // submissions and remote chains.
    let miner_node = Arc::clone(&node);
    let _miner_thread = thread::spawn(move || {
        let miner = Miner::new(&miner_node);
        loop {
            match miner.mine_next_block(&miner_address) {
                Ok(block) => info!("sealed block #{} ({})", block.index, block.hash),
                Err(err) => {
                    info!("miner stopped: {err}");
                    break;
                }
            }
        }
    });

    loop {
        thread::sleep(Duration::from_secs(10));
        let stats = node.stats();
        info!(
            "height={} difficulty={} pool={} last_interval={:?}",
            stats.height, stats.difficulty, stats.pool_size, stats.last_interval_secs
        );
    }
}
