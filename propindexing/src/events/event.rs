use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use derive_more::Display;
use diesel::{Insertable, Queryable};
use ethers::abi::{LogParam, Token};
use ethers::types::{Address, Log};
use uuid::Uuid;

use serde::Deserialize;

use crate::contracts::ContractEvent;
use crate::diesel::schema::propindexing_events;
use crate::hashes::Hashes;

#[derive(Debug, Display)]
pub enum EventDecodeError {
    #[display("log is missing {_0}")]
    MissingField(&'static str),
    #[display("abi decode failed: {_0}")]
    Abi(String),
}

/// One append-only audit row per successfully decoded log. Immutable once
/// written; only a reorg rollback ever deletes it.
///
/// Natural key: (contract_address, transaction_hash, log_index).
#[derive(Debug, Deserialize, Clone, Eq, Queryable, Insertable)]
#[diesel(table_name = propindexing_events)]
pub struct Event {
    pub id: Uuid,
    pub contract_address: String,
    pub contract_name: String,
    pub event_name: String,
    pub abi: String,
    parameters: serde_json::Value,
    topics: serde_json::Value,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_hash: String,
    pub transaction_index: i32,
    pub log_index: i32,
    pub processed_at: chrono::NaiveDateTime,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.contract_address == other.contract_address
            && self.transaction_hash == other.transaction_hash
            && self.log_index == other.log_index
    }
}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract_address.hash(state);
        self.transaction_hash.hash(state);
        self.log_index.hash(state);
    }
}

impl Event {
    pub fn decode(
        log: &Log,
        event: &ContractEvent,
        contract_name: &str,
    ) -> Result<Self, EventDecodeError> {
        let block_hash = log.block_hash.ok_or(EventDecodeError::MissingField("block_hash"))?;
        let block_number =
            log.block_number.ok_or(EventDecodeError::MissingField("block_number"))?;
        let transaction_hash =
            log.transaction_hash.ok_or(EventDecodeError::MissingField("transaction_hash"))?;
        let transaction_index =
            log.transaction_index.ok_or(EventDecodeError::MissingField("transaction_index"))?;
        let log_index = log.log_index.ok_or(EventDecodeError::MissingField("log_index"))?;

        let log_params = event
            .value
            .parse_log(log.clone().into())
            .map_err(|error| EventDecodeError::Abi(error.to_string()))?
            .params;
        let parameters = Self::log_params_to_parameters(&log_params);

        Ok(Self {
            id: Uuid::new_v4(),
            contract_address: Hashes::h160_to_string(&log.address).to_lowercase(),
            contract_name: contract_name.to_owned(),
            event_name: event.value.name.clone(),
            abi: event.abi.clone(),
            parameters: serde_json::to_value(parameters).unwrap(),
            topics: serde_json::to_value(&log.topics).unwrap(),
            block_hash: Hashes::h256_to_string(&block_hash).to_lowercase(),
            block_number: block_number.as_u64() as i64,
            transaction_hash: Hashes::h256_to_string(&transaction_hash).to_lowercase(),
            transaction_index: transaction_index.as_u64() as i32,
            log_index: log_index.low_u64() as i32,
            processed_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
    pub fn get_transaction_index(&self) -> u32 {
        self.transaction_index as u32
    }
    pub fn get_log_index(&self) -> u32 {
        self.log_index as u32
    }

    pub fn get_params(&self) -> EventParam {
        EventParam::new(&self.parameters)
    }

    pub fn match_contract_address(&self, contract_address: &str) -> bool {
        self.contract_address == contract_address.to_lowercase()
    }

    fn log_params_to_parameters(log_params: &[LogParam]) -> HashMap<String, Token> {
        log_params.iter().fold(HashMap::new(), |mut parameters, log_param| {
            parameters.insert(log_param.name.to_string(), log_param.value.clone());

            parameters
        })
    }
}

/// Typed accessors over a decoded event's named arguments.
pub struct EventParam {
    value: HashMap<String, Token>,
}

impl EventParam {
    pub(crate) fn new(parameters: &serde_json::Value) -> EventParam {
        EventParam {
            value: serde_json::from_value(parameters.clone()).unwrap(),
        }
    }

    /// N/B: This function is UNSAFE.
    /// Ensure source contract can be trusted before using it or
    /// preprocess the string before indexing.
    /// A potential attacker could inject SQL string statements from here.
    pub fn get_string_unsafely(&self, key: &str) -> String {
        self.value.get(key).unwrap().to_string()
    }

    /// Returns `bytes` or bytes1, bytes2. bytes3...bytes32
    pub fn get_bytes(&self, key: &str) -> Vec<u8> {
        let token = self.get_token(key);

        token.clone().into_fixed_bytes().or(token.into_bytes()).unwrap()
    }

    pub fn get_u32(&self, key: &str) -> u32 {
        self.get_uint(key).as_u32()
    }
    pub fn get_u64(&self, key: &str) -> u64 {
        self.get_uint(key).as_u64()
    }
    pub fn get_u128(&self, key: &str) -> u128 {
        self.get_uint(key).as_u128()
    }
    /// Same as get_u256
    pub fn get_uint(&self, key: &str) -> ethers::types::U256 {
        self.get_token(key).into_uint().unwrap()
    }
    pub fn get_address_string(&self, key: &str) -> String {
        Hashes::h160_to_string(&self.get_address(key)).to_lowercase()
    }
    pub fn get_address(&self, key: &str) -> Address {
        self.get_token(key).into_address().unwrap()
    }

    fn get_token(&self, key: &str) -> Token {
        self.value.get(key).unwrap().clone()
    }
}
