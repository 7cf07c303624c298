pub mod model;
pub mod pool;

pub use model::TransactionRecord;
pub use pool::TransactionPool;

/// Distinguished sender for block rewards. Bypasses signature checks and
/// the positive-amount rule.
pub const SYSTEM_SENDER: &str = "system";
