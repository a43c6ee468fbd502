use ethers::abi::{encode, Token};
use ethers::types::{Bytes, H160, H256, Log, U256};
use rand::Rng;

use propindexing::ContractEvent;

use super::contracts::{PROPERTY_CREATED_ABI, TOKENS_PURCHASED_ABI};

pub const PROPERTY_OWNER_ADDRESS: &str = "0xb518B3136E491101f22B77F385Fe22269c515188";
pub const TOKEN_BUYER_ADDRESS: &str = "0x7DfD6013cF8d92b751E63d481B51fe0E4c5ABF5E";

/// Deterministic stand-in for a canonical block hash, so separate stub
/// providers agree on history unless a test overrides a height.
pub fn block_hash(block_number: u64) -> H256 {
    H256::from_low_u64_be(block_number.wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// A different hash at the same height: what the chain reports after the
/// block got replaced by a reorg.
pub fn reorged_block_hash(block_number: u64) -> H256 {
    H256::from_low_u64_be(block_number.wrapping_mul(0x0ddb_a11d_ead_beef))
}

pub fn transaction_hash(block_number: u64, log_index: u64) -> H256 {
    H256::from_low_u64_be(block_number * 1_000 + log_index + 1)
}

pub fn property_created_log(
    contract_address: &str,
    block_number: u64,
    log_index: u64,
    property_id: u64,
) -> Log {
    let signature = ContractEvent::new(PROPERTY_CREATED_ABI).value.signature();

    Log {
        topics: vec![
            signature,
            H256::from_low_u64_be(property_id),
            address_topic(PROPERTY_OWNER_ADDRESS),
        ],
        data: Bytes::from(encode(&[
            Token::Uint(U256::from(100u64)),
            Token::Uint(U256::from(1_000u64)),
        ])),
        ..base_log(contract_address, block_number, log_index)
    }
}

pub fn tokens_purchased_log(
    contract_address: &str,
    block_number: u64,
    log_index: u64,
    property_id: u64,
) -> Log {
    let signature = ContractEvent::new(TOKENS_PURCHASED_ABI).value.signature();

    Log {
        topics: vec![
            signature,
            H256::from_low_u64_be(property_id),
            address_topic(TOKEN_BUYER_ADDRESS),
        ],
        data: Bytes::from(encode(&[Token::Uint(U256::from(25u64))])),
        ..base_log(contract_address, block_number, log_index)
    }
}

/// A log whose signature matches nothing in any catalog.
pub fn unknown_event_log(contract_address: &str, block_number: u64, log_index: u64) -> Log {
    Log {
        topics: vec![H256::from_low_u64_be(0xdead_c0de)],
        data: Bytes::default(),
        ..base_log(contract_address, block_number, log_index)
    }
}

/// A PropertyCreated log with truncated data, undecodable on purpose.
pub fn malformed_property_created_log(
    contract_address: &str,
    block_number: u64,
    log_index: u64,
) -> Log {
    let mut log = property_created_log(contract_address, block_number, log_index, 1);
    log.data = Bytes::from(vec![0u8; 31]);

    log
}

/// An indexed address parameter as it appears in a topic: left-padded to
/// 32 bytes.
fn address_topic(address: &str) -> H256 {
    let address: H160 = address.parse().unwrap();
    let mut topic = H256::zero();
    topic.0[12..].copy_from_slice(address.as_bytes());

    topic
}

fn base_log(contract_address: &str, block_number: u64, log_index: u64) -> Log {
    let transaction_index = rand::thread_rng().gen_range(0..800u64);

    Log {
        address: contract_address.parse().unwrap(),
        topics: vec![],
        data: Bytes::default(),
        block_hash: Some(block_hash(block_number)),
        block_number: Some(block_number.into()),
        transaction_hash: Some(transaction_hash(block_number, log_index)),
        transaction_index: Some(transaction_index.into()),
        log_index: Some(log_index.into()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}
