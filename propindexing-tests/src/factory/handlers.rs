use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ethers::types::U256;
use propindexing::{EventContext, EventHandler, HandlerError};

use super::contracts::{PROPERTY_CREATED_ABI, TOKENS_PURCHASED_ABI};

/// Projection table stand-in: property listings keyed by property id.
pub type PropertyListings = Arc<Mutex<HashMap<u64, PropertyListing>>>;

/// Projection table stand-in: token holdings keyed by the event's natural
/// identity, so replays overwrite instead of double-counting.
pub type TokenHoldings = Arc<Mutex<HashMap<(u64, String, String, u32), U256>>>;

pub fn new_property_listings() -> PropertyListings {
    Arc::new(Mutex::new(HashMap::new()))
}

pub fn new_token_holdings() -> TokenHoldings {
    Arc::new(Mutex::new(HashMap::new()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyListing {
    pub property_id: u64,
    pub owner: String,
    pub token_price: U256,
    pub total_tokens: U256,
}

pub struct PropertyCreatedHandler {
    pub listings: PropertyListings,
}

#[async_trait::async_trait]
impl EventHandler for PropertyCreatedHandler {
    fn abi(&self) -> &'static str {
        PROPERTY_CREATED_ABI
    }

    async fn handle_event(&self, context: EventContext<'_>) -> Result<(), HandlerError> {
        let params = context.get_event_params();
        let property_id = params.get_u64("propertyId");

        let listing = PropertyListing {
            property_id,
            owner: params.get_address_string("owner"),
            token_price: params.get_uint("tokenPrice"),
            total_tokens: params.get_uint("totalTokens"),
        };

        self.listings.lock().unwrap().insert(property_id, listing);

        Ok(())
    }
}

pub struct TokensPurchasedHandler {
    pub holdings: TokenHoldings,
}

#[async_trait::async_trait]
impl EventHandler for TokensPurchasedHandler {
    fn abi(&self) -> &'static str {
        TOKENS_PURCHASED_ABI
    }

    async fn handle_event(&self, context: EventContext<'_>) -> Result<(), HandlerError> {
        let params = context.get_event_params();
        let event = context.event;

        let key = (
            params.get_u64("propertyId"),
            params.get_address_string("buyer"),
            event.transaction_hash.clone(),
            event.get_log_index(),
        );

        self.holdings.lock().unwrap().insert(key, params.get_uint("amount"));

        Ok(())
    }
}

pub struct FailingTokensPurchasedHandler;

#[async_trait::async_trait]
impl EventHandler for FailingTokensPurchasedHandler {
    fn abi(&self) -> &'static str {
        TOKENS_PURCHASED_ABI
    }

    async fn handle_event(&self, _context: EventContext<'_>) -> Result<(), HandlerError> {
        Err(HandlerError::new("purchase projection rejected the event"))
    }
}
