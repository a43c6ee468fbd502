use derive_more::Display;

use crate::events::Event;
use crate::indexer_states::{IndexerState, UnsavedIndexerState};

#[derive(Debug, Display)]
pub enum RepoError {
    #[display("repo not connected")]
    NotConnected,
    #[display("{_0}")]
    Unknown(String),
}

impl std::error::Error for RepoError {}

/// Storage boundary for the indexer core. The scheduler is generic over it
/// so tests can inject an in-memory store; `PostgresRepo` is the
/// production implementation.
///
/// The core is the only writer of these tables. Downstream consumers read
/// them and must tolerate audit rows disappearing during a reorg rollback.
#[async_trait::async_trait]
pub trait Repo: Sync + Send + Clone {
    /// Creates the internal tables. Failing here is fatal at startup: the
    /// process refuses to run against unreachable storage.
    async fn migrate(&self) -> Result<(), RepoError>;

    async fn get_indexer_state(
        &self,
        contract_address: &str,
    ) -> Result<Option<IndexerState>, RepoError>;

    async fn get_all_indexer_states(&self) -> Result<Vec<IndexerState>, RepoError>;

    /// Atomically records a finished batch: the audit rows and the
    /// advanced cursor land in one transaction, so the cursor never moves
    /// past events that were not durably written. Audit inserts ignore
    /// conflicts on the natural key, which makes replays converge.
    async fn record_batch(
        &self,
        new_state: &UnsavedIndexerState,
        events: &[Event],
    ) -> Result<(), RepoError>;

    /// Reorg rollback: deletes every audit row at or above the checkpoint
    /// block and rewinds the cursor so the next batch re-fetches from the
    /// checkpoint block itself. The stored checkpoint is cleared; the next
    /// batch re-establishes one.
    async fn roll_back_to_checkpoint(
        &self,
        contract_address: &str,
        checkpoint_block_number: u64,
    ) -> Result<(), RepoError>;

    async fn get_events(
        &self,
        contract_address: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Event>, RepoError>;

    async fn get_all_events(&self) -> Result<Vec<Event>, RepoError>;
}

pub struct SQLikeMigrations;

impl SQLikeMigrations {
    pub fn create_indexer_states() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS propindexing_indexer_states (
                id SERIAL PRIMARY KEY,
                contract_address VARCHAR NOT NULL,
                last_processed_block BIGINT NOT NULL,
                last_block_hash VARCHAR,
                last_checkpoint_block BIGINT,
                last_checkpoint_hash VARCHAR
        )",
            "CREATE UNIQUE INDEX IF NOT EXISTS propindexing_indexer_states_contract_address_index
        ON propindexing_indexer_states(contract_address)",
        ]
    }

    pub fn create_events() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS propindexing_events (
                id uuid PRIMARY KEY,
                contract_address VARCHAR NOT NULL,
                contract_name VARCHAR NOT NULL,
                event_name VARCHAR NOT NULL,
                abi TEXT NOT NULL,
                parameters JSON NOT NULL,
                topics JSON NOT NULL,
                block_hash VARCHAR NOT NULL,
                block_number BIGINT NOT NULL,
                transaction_hash VARCHAR NOT NULL,
                transaction_index INTEGER NOT NULL,
                log_index INTEGER NOT NULL,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS propindexing_events_natural_key_index
            ON propindexing_events(contract_address, transaction_hash, log_index)",
            "CREATE INDEX IF NOT EXISTS propindexing_events_contract_block_index
            ON propindexing_events(contract_address, block_number)",
        ]
    }

    pub fn get_internal_migrations() -> Vec<&'static str> {
        [Self::create_indexer_states(), Self::create_events()].concat()
    }
}
