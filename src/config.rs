use std::env;
use std::str::FromStr;

/// Runtime settings for the ledger core. Loaded once from the environment
/// and passed by value into constructors; components never read globals.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Leading zero hex nibbles required of a valid block hash.
    pub initial_difficulty: u32,
    /// Target seconds between blocks, used by the retarget rule.
    pub target_block_secs: i64,
    /// Retarget every N accepted blocks.
    pub adjustment_interval: usize,
    /// Subsidy paid to the miner via the system-sender reward transaction.
    pub mining_reward: u64,
    /// Capacity of the pending-transaction pool.
    pub max_pool_size: usize,
    /// Maximum pool transactions drained into one block (reward excluded).
    pub max_block_size: usize,
    /// Worker threads partitioning the nonce space.
    pub miner_threads: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            initial_difficulty: 4,
            target_block_secs: 10,
            adjustment_interval: 10,
            mining_reward: 10,
            max_pool_size: 1000,
            max_block_size: 1000,
            miner_threads: 4,
        }
    }
}

impl NodeConfig {
    /// Read settings from the environment, falling back to defaults for
    /// anything missing or unparsable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            initial_difficulty: env_parse("INITIAL_DIFFICULTY", d.initial_difficulty).max(1),
            target_block_secs: env_parse("TARGET_BLOCK_TIME", d.target_block_secs),
            adjustment_interval: env_parse("DIFFICULTY_ADJUSTMENT_INTERVAL", d.adjustment_interval),
            mining_reward: env_parse("MINING_REWARD", d.mining_reward),
            max_pool_size: env_parse("MAX_POOL_SIZE", d.max_pool_size),
            max_block_size: env_parse("MAX_BLOCK_SIZE", d.max_block_size),
            miner_threads: env_parse("MINER_THREADS", d.miner_threads).max(1),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
