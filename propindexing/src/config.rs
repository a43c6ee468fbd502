use ethers::abi::HumanReadableParser;
use ethers::types::Address;

use crate::chain_reorg::MinConfirmationCount;
use crate::contracts::Contract;
use crate::repos::Repo;

pub enum ConfigError {
    NoContract,
    NoJsonRpcUrl,
    ZeroBlocksPerBatch,
    ZeroCheckpointInterval,
    InvalidContractAddress(String),
    InvalidEventAbi(String),
}

impl std::fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoContract => {
                write!(f, "At least one contract is required")
            }
            ConfigError::NoJsonRpcUrl => {
                write!(f, "A JSON RPC URL is required")
            }
            ConfigError::ZeroBlocksPerBatch => {
                write!(f, "The batch size must be greater than zero")
            }
            ConfigError::ZeroCheckpointInterval => {
                write!(f, "The checkpoint interval must be greater than zero")
            }
            ConfigError::InvalidContractAddress(address) => {
                write!(f, "Invalid contract address: {address}")
            }
            ConfigError::InvalidEventAbi(abi) => {
                write!(f, "Invalid event ABI: {abi}")
            }
        }
    }
}

#[derive(Clone)]
pub struct Config<R: Repo> {
    pub repo: R,
    pub json_rpc_url: String,
    pub contracts: Vec<Contract>,
    pub min_confirmation_count: MinConfirmationCount,
    pub blocks_per_batch: u64,
    pub poll_interval_ms: u64,
    pub checkpoint_interval: u64,
    pub reorg_protection: bool,
    pub start_block_lookback: u64,
}

impl<R: Repo> Config<R> {
    pub fn new(repo: R, json_rpc_url: &str) -> Self {
        Self {
            repo,
            json_rpc_url: json_rpc_url.to_string(),
            contracts: vec![],
            min_confirmation_count: MinConfirmationCount::new(3),
            blocks_per_batch: 1_000,
            poll_interval_ms: 10_000,
            checkpoint_interval: 100,
            reorg_protection: true,
            start_block_lookback: 1_000,
        }
    }

    pub fn add_contract(mut self, contract: Contract) -> Self {
        self.contracts.push(contract);

        self
    }

    pub fn with_min_confirmation_count(mut self, min_confirmation_count: u8) -> Self {
        self.min_confirmation_count = MinConfirmationCount::new(min_confirmation_count);

        self
    }

    pub fn with_blocks_per_batch(mut self, blocks_per_batch: u64) -> Self {
        self.blocks_per_batch = blocks_per_batch;

        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;

        self
    }

    pub fn with_checkpoint_interval(mut self, checkpoint_interval: u64) -> Self {
        self.checkpoint_interval = checkpoint_interval;

        self
    }

    pub fn with_reorg_protection(mut self, reorg_protection: bool) -> Self {
        self.reorg_protection = reorg_protection;

        self
    }

    /// How far behind the chain head an unconfigured contract starts
    /// indexing from, instead of scanning the whole history.
    pub fn with_start_block_lookback(mut self, start_block_lookback: u64) -> Self {
        self.start_block_lookback = start_block_lookback;

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contracts.is_empty() {
            return Err(ConfigError::NoContract);
        }
        if self.json_rpc_url.is_empty() {
            return Err(ConfigError::NoJsonRpcUrl);
        }
        if self.blocks_per_batch == 0 {
            return Err(ConfigError::ZeroBlocksPerBatch);
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::ZeroCheckpointInterval);
        }

        for contract in &self.contracts {
            if contract.address.parse::<Address>().is_err() {
                return Err(ConfigError::InvalidContractAddress(contract.address.clone()));
            }

            for abi in contract.get_event_abis() {
                if HumanReadableParser::parse_event(abi).is_err() {
                    return Err(ConfigError::InvalidEventAbi(abi.to_string()));
                }
            }
        }

        Ok(())
    }
}
