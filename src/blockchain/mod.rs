pub mod block;
pub mod difficulty;
pub mod model;

pub use block::Block;
pub use difficulty::DifficultyController;
pub use model::Ledger;

/// previous_hash of the genesis block: 64 zero hex characters.
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
