use std::sync::Arc;

use ethers::types::Log;
use futures_util::try_join;
use tracing::{debug, error, warn};

use crate::chain_reorg::Checkpoint;
use crate::contracts::{Contract, EventCatalog};
use crate::events::Event;
use crate::handlers::EventContext;
use crate::indexer_states::{IndexerState, UnsavedIndexerState};
use crate::repos::Repo;
use crate::Config;

use super::provider::{self, Provider};
use super::window::{self, BatchWindow};
use super::SchedulerError;

#[derive(Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Ingested { to_block: u64, event_count: usize },
    WaitingForConfirmations,
}

/// One batch for one contract: compute the safe window, fetch its logs,
/// decode and dispatch them, then advance the cursor atomically with the
/// audit inserts.
pub async fn run<R: Repo>(
    config: &Config<R>,
    catalog: &EventCatalog,
    provider: &Arc<impl Provider>,
    contract: &Contract,
    state: Option<&IndexerState>,
    current_block_number: u64,
) -> Result<BatchOutcome, SchedulerError> {
    let next_block_number = window::next_block_number(
        state,
        contract,
        current_block_number,
        config.start_block_lookback,
    );

    let Some(window) = BatchWindow::maybe_new(
        next_block_number,
        current_block_number,
        &config.min_confirmation_count,
        config.blocks_per_batch,
    ) else {
        return Ok(BatchOutcome::WaitingForConfirmations);
    };

    let topics = catalog.get_event_topics(&contract.address);
    let filter = window.to_filter(contract, &topics);

    let (mut logs, to_block_hash) = try_join!(
        provider.get_logs(&filter),
        provider::fetch_block_hash(provider, window.to_block),
    )?;

    // getLogs returns chain order within a window, but nothing in the
    // cursor logic should depend on the node honoring that.
    logs.sort_by_key(|log| {
        (
            log.block_number.map(|n| n.as_u64()).unwrap_or_default(),
            log.log_index.map(|i| i.low_u64()).unwrap_or_default(),
        )
    });

    let events = decode_and_dispatch(&logs, catalog, contract).await;

    let checkpoint = advance_checkpoint(state, &window, provider, config.checkpoint_interval)
        .await?;

    let new_state = UnsavedIndexerState::new(
        &contract.address,
        window.to_block,
        &to_block_hash,
        checkpoint.as_ref(),
    );

    let event_count = events.len();
    config.repo.record_batch(&new_state, &events).await?;

    debug!(
        contract = %contract.name,
        from_block = window.from_block,
        to_block = window.to_block,
        event_count,
        "batch ingested"
    );

    Ok(BatchOutcome::Ingested {
        to_block: window.to_block,
        event_count,
    })
}

/// Decodes each log against the catalog and hands it to its registered
/// handler. Every per-log failure mode is isolated: unknown signatures and
/// malformed payloads are skipped, and a handler error never stops the
/// rest of the batch or the cursor from advancing past it.
async fn decode_and_dispatch(
    logs: &[Log],
    catalog: &EventCatalog,
    contract: &Contract,
) -> Vec<Event> {
    let mut events = Vec::with_capacity(logs.len());

    for log in logs {
        let Some(topic0) = log.topics.first() else {
            warn!(contract = %contract.name, "skipping log with no topics");
            continue;
        };

        let Some(contract_event) = catalog.find_event(&contract.address, topic0) else {
            debug!(contract = %contract.name, topic0 = ?topic0, "skipping unknown event");
            continue;
        };

        let event = match Event::decode(log, contract_event, &contract.name) {
            Ok(event) => event,
            Err(decode_error) => {
                warn!(
                    contract = %contract.name,
                    block_number = ?log.block_number,
                    transaction_hash = ?log.transaction_hash,
                    log_index = ?log.log_index,
                    %decode_error,
                    "skipping undecodable log"
                );
                continue;
            }
        };

        match catalog.find_handler(&contract.address, &contract_event.abi) {
            None => {
                warn!(
                    contract = %contract.name,
                    event_name = %event.event_name,
                    "no handler registered, skipping projection"
                );
            }
            Some(handler) => {
                if let Err(handler_error) = handler.handle_event(EventContext::new(&event)).await {
                    error!(
                        contract = %contract.name,
                        event_name = %event.event_name,
                        block_number = event.block_number,
                        transaction_hash = %event.transaction_hash,
                        log_index = event.log_index,
                        %handler_error,
                        "handler failed, continuing batch"
                    );
                }
            }
        }

        events.push(event);
    }

    events
}

/// A checkpoint advances only when the batch window contains a
/// checkpoint-interval multiple; every other batch carries the previous
/// checkpoint forward unchanged, bounding rollback depth without a header
/// fetch per block.
async fn advance_checkpoint(
    state: Option<&IndexerState>,
    window: &BatchWindow,
    provider: &Arc<impl Provider>,
    checkpoint_interval: u64,
) -> Result<Option<Checkpoint>, SchedulerError> {
    let boundary = Checkpoint::boundary(window.to_block, checkpoint_interval);

    if boundary >= window.from_block {
        let boundary_hash = provider::fetch_block_hash(provider, boundary).await?;

        return Ok(Some(Checkpoint::new(boundary, &boundary_hash)));
    }

    Ok(state.and_then(|state| state.checkpoint()))
}
