/// Tolerance for chain re-organization
#[derive(Clone, Debug)]
pub struct MinConfirmationCount {
    value: u8,
}

impl MinConfirmationCount {
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Highest block considered safe to index at the given chain head.
    /// Clamped at the genesis block for young chains.
    pub fn confirmed_block(&self, current_block_number: u64) -> u64 {
        current_block_number.saturating_sub(self.value as u64)
    }
}

/// A periodically snapshotted (block, hash) pair used to detect reorgs
/// without re-verifying every previously processed block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub block_number: u64,
    pub block_hash: String,
}

impl Checkpoint {
    pub fn new(block_number: u64, block_hash: &str) -> Self {
        Self {
            block_number,
            block_hash: block_hash.to_string(),
        }
    }

    /// Highest checkpoint-interval multiple at or below `block_number`.
    pub fn boundary(block_number: u64, checkpoint_interval: u64) -> u64 {
        block_number - (block_number % checkpoint_interval)
    }
}
