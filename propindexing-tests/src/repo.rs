use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use propindexing::{Event, IndexerState, Repo, RepoError, UnsavedIndexerState};

/// In-memory `Repo` with the same conflict-ignore and upsert semantics as
/// the Postgres implementation, so scheduler tests run without a database.
#[derive(Clone, Default)]
pub struct InMemoryRepo {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    states: HashMap<String, IndexerState>,
    events: Vec<Event>,
    next_state_id: i32,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Repo for InMemoryRepo {
    async fn migrate(&self) -> Result<(), RepoError> {
        Ok(())
    }

    async fn get_indexer_state(
        &self,
        contract_address: &str,
    ) -> Result<Option<IndexerState>, RepoError> {
        let inner = self.inner.lock().unwrap();

        Ok(inner.states.get(&contract_address.to_lowercase()).cloned())
    }

    async fn get_all_indexer_states(&self) -> Result<Vec<IndexerState>, RepoError> {
        let inner = self.inner.lock().unwrap();

        Ok(inner.states.values().cloned().collect())
    }

    async fn record_batch(
        &self,
        new_state: &UnsavedIndexerState,
        events: &[Event],
    ) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().unwrap();

        for event in events {
            let already_recorded = inner.events.iter().any(|existing| {
                existing.contract_address == event.contract_address
                    && existing.transaction_hash == event.transaction_hash
                    && existing.log_index == event.log_index
            });

            if !already_recorded {
                inner.events.push(event.clone());
            }
        }

        let address = new_state.contract_address.clone();

        match inner.states.get_mut(&address) {
            Some(state) => {
                state.last_processed_block = new_state.last_processed_block;
                state.last_block_hash = new_state.last_block_hash.clone();
                state.last_checkpoint_block = new_state.last_checkpoint_block;
                state.last_checkpoint_hash = new_state.last_checkpoint_hash.clone();
            }
            None => {
                inner.next_state_id += 1;
                let id = inner.next_state_id;

                inner.states.insert(
                    address.clone(),
                    IndexerState {
                        id,
                        contract_address: address,
                        last_processed_block: new_state.last_processed_block,
                        last_block_hash: new_state.last_block_hash.clone(),
                        last_checkpoint_block: new_state.last_checkpoint_block,
                        last_checkpoint_hash: new_state.last_checkpoint_hash.clone(),
                    },
                );
            }
        }

        Ok(())
    }

    async fn roll_back_to_checkpoint(
        &self,
        contract_address: &str,
        checkpoint_block_number: u64,
    ) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let address = contract_address.to_lowercase();

        inner.events.retain(|event| {
            !(event.contract_address == address
                && event.block_number >= checkpoint_block_number as i64)
        });

        if let Some(state) = inner.states.get_mut(&address) {
            state.last_processed_block = checkpoint_block_number as i64 - 1;
            state.last_block_hash = None;
            state.last_checkpoint_block = None;
            state.last_checkpoint_hash = None;
        }

        Ok(())
    }

    async fn get_events(
        &self,
        contract_address: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Event>, RepoError> {
        let inner = self.inner.lock().unwrap();
        let address = contract_address.to_lowercase();

        let mut events: Vec<_> = inner
            .events
            .iter()
            .filter(|event| {
                event.contract_address == address
                    && event.block_number >= from_block as i64
                    && event.block_number <= to_block as i64
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| (event.block_number, event.log_index));

        Ok(events)
    }

    async fn get_all_events(&self) -> Result<Vec<Event>, RepoError> {
        let inner = self.inner.lock().unwrap();

        let mut events = inner.events.clone();
        events.sort_by_key(|event| (event.block_number, event.log_index));

        Ok(events)
    }
}
