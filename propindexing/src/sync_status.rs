use std::sync::Arc;

use serde::Serialize;

use crate::repos::Repo;
use crate::scheduler::{provider::Provider, SchedulerError};

/// Staleness read model for downstream consumers: the indexer publishes
/// no events of its own, so "blocks behind" is the only way to tell a
/// fresh projection from a stalled one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub contract_address: String,
    pub current_block_number: u64,
    pub last_processed_block: Option<u64>,
    pub blocks_behind: Option<u64>,
}

pub async fn get<R: Repo>(
    repo: &R,
    provider: &Arc<impl Provider>,
    contract_address: &str,
) -> Result<SyncStatus, SchedulerError> {
    let current_block_number = provider.get_block_number().await?.as_u64();
    let state = repo.get_indexer_state(contract_address).await?;

    let last_processed_block = state.map(|state| state.last_processed_block.max(0) as u64);

    Ok(SyncStatus {
        contract_address: contract_address.to_lowercase(),
        current_block_number,
        blocks_behind: last_processed_block
            .map(|last_processed| current_block_number.saturating_sub(last_processed)),
        last_processed_block,
    })
}
