use std::sync::Arc;

use tracing::{debug, warn};

use crate::chain_reorg::Checkpoint;
use crate::indexer_states::IndexerState;
use crate::repos::Repo;

use super::provider::{self, Provider};
use super::SchedulerError;

/// Runs while a contract waits for confirmations: compares the remembered
/// checkpoint hash against the canonical chain and rolls back on
/// divergence. Returns whether a rollback happened.
pub async fn run<R: Repo>(
    repo: &R,
    provider: &Arc<impl Provider>,
    state: &IndexerState,
) -> Result<bool, SchedulerError> {
    let Some(checkpoint) = state.checkpoint() else {
        debug!(
            contract_address = %state.contract_address,
            "no checkpoint yet, skipping reorg detection"
        );
        return Ok(false);
    };

    if !detect(provider, &checkpoint).await {
        return Ok(false);
    }

    warn!(
        contract_address = %state.contract_address,
        checkpoint_block = checkpoint.block_number,
        expected_hash = %checkpoint.block_hash,
        "chain reorg detected, rolling back to checkpoint"
    );

    repo.roll_back_to_checkpoint(&state.contract_address, checkpoint.block_number)
        .await?;

    Ok(true)
}

/// True when the chain's hash at the checkpoint height no longer matches
/// the one we remembered. Headers are hash-chained, so a matching
/// checkpoint hash also vouches for every processed block above it.
///
/// Fails open: a header-fetch error reports "no reorg" rather than
/// blocking the poll loop, accepting that a reorg coinciding with an RPC
/// outage is caught on a later tick at the earliest.
pub async fn detect(provider: &Arc<impl Provider>, checkpoint: &Checkpoint) -> bool {
    match provider::fetch_block_hash(provider, checkpoint.block_number).await {
        Ok(current_hash) => current_hash != checkpoint.block_hash.to_lowercase(),
        Err(error) => {
            warn!(
                checkpoint_block = checkpoint.block_number,
                %error,
                "header fetch failed during reorg detection, assuming no reorg"
            );
            false
        }
    }
}
