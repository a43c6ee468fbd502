use diesel::{Identifiable, Insertable, Queryable};

use crate::chain_reorg::Checkpoint;
use crate::diesel::schema::propindexing_indexer_states;

/// N/B: The order has to match ./diesel.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = propindexing_indexer_states)]
#[diesel(primary_key(id))]
pub struct IndexerState {
    pub id: i32,
    pub contract_address: String,
    pub last_processed_block: i64,
    pub last_block_hash: Option<String>,
    pub last_checkpoint_block: Option<i64>,
    pub last_checkpoint_hash: Option<String>,
}

impl IndexerState {
    /// The next block the scheduler will fetch for this contract.
    pub fn next_block_number(&self) -> u64 {
        (self.last_processed_block + 1).max(0) as u64
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match (&self.last_checkpoint_block, &self.last_checkpoint_hash) {
            (Some(block_number), Some(block_hash)) => {
                Some(Checkpoint::new(*block_number as u64, block_hash))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = propindexing_indexer_states)]
pub struct UnsavedIndexerState {
    pub contract_address: String,
    pub last_processed_block: i64,
    pub last_block_hash: Option<String>,
    pub last_checkpoint_block: Option<i64>,
    pub last_checkpoint_hash: Option<String>,
}

impl UnsavedIndexerState {
    pub fn new(
        contract_address: &str,
        last_processed_block: u64,
        last_block_hash: &str,
        checkpoint: Option<&Checkpoint>,
    ) -> Self {
        Self {
            contract_address: contract_address.to_lowercase(),
            last_processed_block: last_processed_block as i64,
            last_block_hash: Some(last_block_hash.to_lowercase()),
            last_checkpoint_block: checkpoint.map(|c| c.block_number as i64),
            last_checkpoint_hash: checkpoint.map(|c| c.block_hash.to_lowercase()),
        }
    }
}
