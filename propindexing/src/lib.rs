mod chain_reorg;
mod config;
mod contracts;
mod diesel;
pub mod events;
mod handlers;
pub mod hashes;
mod indexer_states;
mod repos;
pub mod scheduler;
pub mod sync_status;

pub use chain_reorg::{Checkpoint, MinConfirmationCount};
pub use config::{Config, ConfigError};
pub use contracts::{Contract, ContractEvent, ContractEventTopic, EventCatalog};
pub use events::{Event, EventDecodeError, EventParam};
pub use handlers::{EventContext, EventHandler, HandlerError};
pub use indexer_states::{IndexerState, UnsavedIndexerState};
pub use repos::*;
pub use scheduler::{
    Backfill, BatchOutcome, BatchWindow, IndexerHandle, Provider, ProviderError, SchedulerError,
};
pub use sync_status::SyncStatus;

use std::fmt::Debug;

pub use ethers::types::{Address, U256, U256 as BigInt, U256 as Uint};

#[cfg(feature = "postgres")]
pub type PropindexingRepo = PostgresRepo;

pub enum PropindexingError {
    Config(ConfigError),
    Repo(RepoError),
}

impl From<ConfigError> for PropindexingError {
    fn from(value: ConfigError) -> Self {
        PropindexingError::Config(value)
    }
}

impl From<RepoError> for PropindexingError {
    fn from(value: RepoError) -> Self {
        PropindexingError::Repo(value)
    }
}

impl Debug for PropindexingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropindexingError::Config(config_error) => {
                write!(f, "Config Error: {:?}", config_error)
            }
            PropindexingError::Repo(repo_error) => {
                write!(f, "Repo Error: {}", repo_error)
            }
        }
    }
}

/// Validates the config, prepares storage, and spawns the poll loop.
/// Refuses to start against invalid configuration or unreachable storage
/// rather than running in a degraded mode.
pub async fn start<R: Repo + 'static>(
    config: &Config<R>,
) -> Result<IndexerHandle, PropindexingError> {
    config.validate()?;
    config.repo.migrate().await?;

    Ok(scheduler::start(config))
}
