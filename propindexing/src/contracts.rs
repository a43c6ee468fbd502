use std::fmt::Debug;
use std::{collections::HashMap, sync::Arc};

use ethers::abi::{Event as AbiEvent, HumanReadableParser};
use ethers::types::H256;

use crate::handlers::EventHandler;

pub type ContractEventTopic = H256;

#[derive(Debug, Clone)]
pub struct ContractEvent {
    pub abi: String,
    pub value: AbiEvent,
}

impl ContractEvent {
    pub fn new(abi: &str) -> Self {
        Self {
            abi: abi.to_string(),
            value: HumanReadableParser::parse_event(abi).unwrap(),
        }
    }
}

type EventAbi = &'static str;

/// A tracked contract: one on-chain address plus the events it emits and
/// the projection handlers registered for them.
#[derive(Clone)]
pub struct Contract {
    pub name: String,
    pub address: String,
    pub start_block_number: Option<u64>,
    pub handlers: HashMap<EventAbi, Arc<dyn EventHandler>>,
}

impl Contract {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_lowercase(),
            start_block_number: None,
            handlers: HashMap::new(),
        }
    }

    /// Deployment block override. Without it, indexing starts a small
    /// lookback behind the current chain head rather than scanning the
    /// whole history.
    pub fn with_start_block_number(mut self, start_block_number: u64) -> Self {
        self.start_block_number = Some(start_block_number);

        self
    }

    pub fn add_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.insert(handler.abi(), Arc::new(handler));

        self
    }

    pub fn get_event_abis(&self) -> Vec<EventAbi> {
        self.handlers.keys().copied().collect()
    }

    pub fn build_events(&self) -> Vec<ContractEvent> {
        self.get_event_abis().iter().map(|abi| ContractEvent::new(abi)).collect()
    }
}

impl Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

/// Static dispatch table built once at startup: event signatures are
/// precomputed per contract address so matching an incoming log is a map
/// lookup, not an ABI re-parse.
pub struct EventCatalog {
    events_by_address_and_topic: HashMap<(String, ContractEventTopic), ContractEvent>,
    handlers_by_address_and_abi: HashMap<(String, String), Arc<dyn EventHandler>>,
    topics_by_address: HashMap<String, Vec<ContractEventTopic>>,
}

impl EventCatalog {
    pub fn new(contracts: &[Contract]) -> Self {
        let mut events_by_address_and_topic = HashMap::new();
        let mut handlers_by_address_and_abi = HashMap::new();
        let mut topics_by_address: HashMap<String, Vec<ContractEventTopic>> = HashMap::new();

        for contract in contracts {
            let address = contract.address.clone();

            for event in contract.build_events() {
                let topic = event.value.signature();

                topics_by_address.entry(address.clone()).or_default().push(topic);
                events_by_address_and_topic.insert((address.clone(), topic), event);
            }

            for (abi, handler) in &contract.handlers {
                handlers_by_address_and_abi
                    .insert((address.clone(), abi.to_string()), handler.clone());
            }
        }

        Self {
            events_by_address_and_topic,
            handlers_by_address_and_abi,
            topics_by_address,
        }
    }

    pub fn find_event(&self, contract_address: &str, topic: &ContractEventTopic) -> Option<&ContractEvent> {
        self.events_by_address_and_topic
            .get(&(contract_address.to_lowercase(), *topic))
    }

    pub fn find_handler(
        &self,
        contract_address: &str,
        abi: &str,
    ) -> Option<&Arc<dyn EventHandler>> {
        self.handlers_by_address_and_abi
            .get(&(contract_address.to_lowercase(), abi.to_string()))
    }

    pub fn get_event_topics(&self, contract_address: &str) -> Vec<ContractEventTopic> {
        self.topics_by_address
            .get(&contract_address.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}
