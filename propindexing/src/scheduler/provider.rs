use std::sync::Arc;

use ethers::prelude::Middleware;
use ethers::providers::{Http, Provider as EthersProvider, ProviderError as EthersProviderError};
use ethers::types::{Block, Filter as EthersFilter, Log, TxHash, U64};

use crate::hashes::Hashes;

pub type ProviderError = EthersProviderError;

/// Read-only boundary to the remote node. No write access to the chain is
/// required anywhere in this core.
#[async_trait::async_trait]
pub trait Provider: Clone + Sync + Send {
    async fn get_block_number(&self) -> Result<U64, ProviderError>;
    async fn get_logs(&self, filter: &EthersFilter) -> Result<Vec<Log>, ProviderError>;
    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError>;
}

#[async_trait::async_trait]
impl Provider for EthersProvider<Http> {
    async fn get_block_number(&self) -> Result<U64, ProviderError> {
        Middleware::get_block_number(&self).await
    }

    async fn get_logs(&self, filter: &EthersFilter) -> Result<Vec<Log>, ProviderError> {
        Middleware::get_logs(&self, filter).await
    }

    async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
        Middleware::get_block(&self, block_number)
            .await?
            .ok_or_else(|| ProviderError::CustomError(format!("block {block_number} not found")))
    }
}

pub fn get(json_rpc_url: &str) -> Arc<impl Provider> {
    Arc::new(EthersProvider::<Http>::try_from(json_rpc_url).unwrap())
}

/// Canonical-chain hash at the given height, in the lowercase hex form
/// stored and compared everywhere downstream.
pub async fn fetch_block_hash(
    provider: &Arc<impl Provider>,
    block_number: u64,
) -> Result<String, ProviderError> {
    let block = provider.get_block(block_number.into()).await?;

    block
        .hash
        .map(|hash| Hashes::h256_to_string(&hash).to_lowercase())
        .ok_or_else(|| {
            ProviderError::CustomError(format!("block {block_number} has no hash yet"))
        })
}
