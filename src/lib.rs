//! Single-node ledger core: an append-only chain of Proof-of-Work blocks,
//! a bounded pool of pending transactions, and a longest-valid-chain
//! fork-choice rule. Transport, persistence and wallet UIs live outside
//! this crate and only talk to it through [`node::Node`].

pub mod blockchain;
pub mod config;
pub mod error;
pub mod miner;
pub mod node;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, DifficultyController, Ledger};
pub use config::NodeConfig;
pub use error::{ConsensusError, MiningError, PoolError, ValidationError};
pub use miner::Miner;
pub use node::Node;
pub use transaction::{TransactionPool, TransactionRecord};
