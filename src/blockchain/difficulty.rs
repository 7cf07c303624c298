use log::info;

use super::Block;

/// Lowest difficulty the retarget rule may reach.
pub const MIN_DIFFICULTY: u32 = 1;

/// Tracks and retargets the Proof-of-Work threshold (leading zero hex
/// nibbles required of a block hash).
#[derive(Debug, Clone)]
pub struct DifficultyController {
    difficulty: u32,
    target_block_secs: i64,
    adjustment_interval: usize,
}

impl DifficultyController {
    pub fn new(initial_difficulty: u32, target_block_secs: i64, adjustment_interval: usize) -> Self {
        Self {
            difficulty: initial_difficulty.max(MIN_DIFFICULTY),
            target_block_secs,
            adjustment_interval,
        }
    }

    pub fn current(&self) -> u32 {
        self.difficulty
    }

    /// Retarget check, invoked after every accepted block. No-op unless the
    /// chain length is a multiple of the adjustment interval. Averages the
    /// inter-block gaps over the last `adjustment_interval` blocks: under
    /// half the target raises difficulty by 1, over double lowers it by 1
    /// (never below the floor).
    pub fn maybe_retarget(&mut self, chain: &[Block]) {
        if self.adjustment_interval < 2
            || chain.len() < self.adjustment_interval
            || chain.len() % self.adjustment_interval != 0
        {
            return;
        }

        let window = &chain[chain.len() - self.adjustment_interval..];
        let mut total_secs: i64 = 0;
        for pair in window.windows(2) {
            total_secs += (pair[1].timestamp - pair[0].timestamp).max(0);
        }
        let avg_secs = total_secs as f64 / (self.adjustment_interval - 1) as f64;
        let target = self.target_block_secs as f64;

        if avg_secs < target / 2.0 {
            self.difficulty += 1;
            info!(
                "DIFF - blocks too fast (avg {:.1}s, target {}s): difficulty -> {}",
                avg_secs, self.target_block_secs, self.difficulty
            );
        } else if avg_secs > target * 2.0 {
            self.difficulty = self.difficulty.saturating_sub(1).max(MIN_DIFFICULTY);
            info!(
                "DIFF - blocks too slow (avg {:.1}s, target {}s): difficulty -> {}",
                avg_secs, self.target_block_secs, self.difficulty
            );
        }
    }
}
