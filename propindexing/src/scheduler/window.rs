use std::cmp::min;

use ethers::types::{Address, Filter as EthersFilter};

use crate::chain_reorg::MinConfirmationCount;
use crate::contracts::{Contract, ContractEventTopic};
use crate::indexer_states::IndexerState;

/// Inclusive block range one batch covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchWindow {
    pub from_block: u64,
    pub to_block: u64,
}

impl BatchWindow {
    /// None means the cursor is already past the confirmed head: the
    /// contract is waiting for confirmations and no fetch happens this
    /// tick. An inverted range is a no-op, never an error.
    pub fn maybe_new(
        next_block_number: u64,
        current_block_number: u64,
        min_confirmation_count: &MinConfirmationCount,
        blocks_per_batch: u64,
    ) -> Option<BatchWindow> {
        let confirmed_block = min_confirmation_count.confirmed_block(current_block_number);

        if next_block_number > confirmed_block {
            return None;
        }

        Some(BatchWindow {
            from_block: next_block_number,
            to_block: min(next_block_number + blocks_per_batch - 1, confirmed_block),
        })
    }

    pub fn to_filter(&self, contract: &Contract, topics: &[ContractEventTopic]) -> EthersFilter {
        EthersFilter::new()
            .address(contract.address.parse::<Address>().unwrap())
            .topic0(topics.to_vec())
            .from_block(self.from_block)
            .to_block(self.to_block)
    }
}

/// The block the next batch starts from: the persisted cursor when one
/// exists, otherwise the configured deployment block, otherwise a small
/// lookback behind the head to avoid an unbounded historical scan.
pub fn next_block_number(
    state: Option<&IndexerState>,
    contract: &Contract,
    current_block_number: u64,
    start_block_lookback: u64,
) -> u64 {
    match state {
        Some(state) => state.next_block_number(),
        None => contract
            .start_block_number
            .unwrap_or_else(|| current_block_number.saturating_sub(start_block_lookback)),
    }
}
