use thiserror::Error;

/// Malformed transaction content, rejected at the boundary before any
/// signature or capacity check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sender and recipient must be non-empty")]
    MissingEndpoint,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
}

/// Rejection reasons for transaction-pool admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("missing or invalid signature")]
    Signature,
    #[error("transaction pool is full (max {0})")]
    Capacity(usize),
}

/// Rejection reasons for appending a block to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("block index {got} does not extend chain of length {expected}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("previous_hash does not match the current tip")]
    StaleTip,
    #[error("block hash does not match its contents")]
    HashMismatch,
    #[error("block hash does not meet difficulty {0}")]
    InsufficientWork(u32),
}

/// Stale tips are recovered internally by restarting the search, so the
/// only mining failure a caller ever sees is cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("mining was cancelled before a block was found")]
    Cancelled,
}
