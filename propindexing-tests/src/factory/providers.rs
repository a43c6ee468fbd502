use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ethers::types::{Address, Block, Filter, Log, TxHash, ValueOrArray, H256, U64};

use propindexing::{Provider, ProviderError};

use super::logs::block_hash;

/// Configurable stub chain: serves a fixed head, a canned log set filtered
/// the way a real node would by address and range, and per-height block
/// hashes. Records every requested filter so tests can assert on the
/// windows the scheduler asked for.
#[derive(Clone, Default)]
pub struct StubProvider {
    pub current_block_number: u64,
    pub logs: Vec<Log>,
    block_hashes: Arc<Mutex<HashMap<u64, H256>>>,
    fail_get_logs_for: Option<Address>,
    fail_get_block: bool,
    seen_filters: Arc<Mutex<Vec<Filter>>>,
}

impl StubProvider {
    pub fn new(current_block_number: u64) -> Self {
        Self {
            current_block_number,
            ..Default::default()
        }
    }

    pub fn with_logs(mut self, logs: Vec<Log>) -> Self {
        self.logs = logs;

        self
    }

    /// Overrides the canonical hash at one height, e.g. to simulate the
    /// chain rewriting a checkpointed block.
    pub fn with_block_hash(self, block_number: u64, hash: H256) -> Self {
        self.block_hashes.lock().unwrap().insert(block_number, hash);

        self
    }

    pub fn failing_get_logs_for(mut self, address: &str) -> Self {
        self.fail_get_logs_for = Some(address.parse().unwrap());

        self
    }

    pub fn failing_get_block(mut self) -> Self {
        self.fail_get_block = true;

        self
    }

    pub fn seen_filters(&self) -> Vec<Filter> {
        self.seen_filters.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for StubProvider {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        Ok(self.current_block_number.into())
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
        self.seen_filters.lock().unwrap().push(filter.clone());

        if let (Some(failing_address), Some(ValueOrArray::Value(filter_address))) =
            (self.fail_get_logs_for, filter.address.clone())
        {
            if failing_address == filter_address {
                return Err(ProviderError::CustomError("stubbed getLogs outage".to_string()));
            }
        }

        let from_block = filter.get_from_block().map(|block| block.as_u64()).unwrap_or_default();
        let to_block = filter.get_to_block().map(|block| block.as_u64()).unwrap_or(u64::MAX);

        Ok(self
            .logs
            .iter()
            .filter(|log| {
                let block_number = log.block_number.map(|number| number.as_u64()).unwrap_or_default();

                let address_matches = match &filter.address {
                    Some(ValueOrArray::Value(address)) => log.address == *address,
                    Some(ValueOrArray::Array(addresses)) => addresses.contains(&log.address),
                    None => true,
                };

                address_matches && block_number >= from_block && block_number <= to_block
            })
            .cloned()
            .collect())
    }

    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
        if self.fail_get_block {
            return Err(ProviderError::CustomError("stubbed header outage".to_string()));
        }

        let number = block_number.as_u64();
        let hash = self
            .block_hashes
            .lock()
            .unwrap()
            .get(&number)
            .copied()
            .unwrap_or_else(|| block_hash(number));

        Ok(Block {
            number: Some(block_number),
            hash: Some(hash),
            ..Default::default()
        })
    }
}
