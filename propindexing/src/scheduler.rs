mod error;
mod ingest_events;
mod maybe_handle_chain_reorg;
pub mod provider;
pub mod window;

pub use error::SchedulerError;
pub use ingest_events::BatchOutcome;
pub use maybe_handle_chain_reorg::detect;
pub use provider::{Provider, ProviderError};
pub use window::BatchWindow;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, warn};

use crate::contracts::{Contract, EventCatalog};
use crate::repos::Repo;
use crate::Config;

/// Deep historical re-scan over a block range that predates the tracked
/// cursor. No implementation ships with the core; operators plug one in
/// when the default head-lookback start is not enough.
#[async_trait::async_trait]
pub trait Backfill: Send + Sync {
    async fn run(
        &self,
        contract_address: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<(), SchedulerError>;
}

/// Handle to a running poll loop. `stop` flips a flag checked between
/// ticks; an in-flight batch is allowed to finish, so shutdown latency is
/// bounded by one batch plus one poll interval.
pub struct IndexerHandle {
    running: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

impl IndexerHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub async fn wait_until_stopped(self) {
        let _ = self.task.await;
    }
}

pub fn start<R: Repo + 'static>(config: &Config<R>) -> IndexerHandle {
    let config = config.clone();
    let running = Arc::new(AtomicBool::new(true));

    let task = tokio::spawn({
        let running = running.clone();

        async move {
            let provider = provider::get(&config.json_rpc_url);
            let catalog = EventCatalog::new(&config.contracts);
            let mut interval = interval(Duration::from_millis(config.poll_interval_ms));

            while running.load(Ordering::Relaxed) {
                run_tick(&config, &provider, &catalog).await;

                interval.tick().await;
            }
        }
    });

    IndexerHandle { running, task }
}

/// One scheduling pass over every tracked contract. Public so tests can
/// drive single ticks without the loop.
///
/// Contracts are isolated from each other: a failure while processing one
/// is logged and must not prevent the rest from running this tick.
pub async fn run_tick<R: Repo>(
    config: &Config<R>,
    provider: &Arc<impl Provider>,
    catalog: &EventCatalog,
) {
    let current_block_number = match provider.get_block_number().await {
        Ok(block_number) => block_number.as_u64(),
        Err(error) => {
            warn!(%error, "failed to fetch chain head, skipping tick");
            return;
        }
    };

    for contract in &config.contracts {
        if let Err(error) =
            process_contract(config, provider, catalog, contract, current_block_number).await
        {
            error!(
                contract = %contract.name,
                contract_address = %contract.address,
                %error,
                "batch failed, retrying next tick"
            );
        }
    }
}

async fn process_contract<R: Repo>(
    config: &Config<R>,
    provider: &Arc<impl Provider>,
    catalog: &EventCatalog,
    contract: &Contract,
    current_block_number: u64,
) -> Result<(), SchedulerError> {
    let state = config.repo.get_indexer_state(&contract.address).await?;

    let outcome = ingest_events::run(
        config,
        catalog,
        provider,
        contract,
        state.as_ref(),
        current_block_number,
    )
    .await?;

    if let BatchOutcome::WaitingForConfirmations = outcome {
        if config.reorg_protection {
            if let Some(state) = &state {
                maybe_handle_chain_reorg::run(&config.repo, provider, state).await?;
            }
        }
    }

    Ok(())
}
