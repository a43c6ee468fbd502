use propindexing::Contract;

use super::handlers::{
    FailingTokensPurchasedHandler, PropertyCreatedHandler, PropertyListings,
    TokenHoldings, TokensPurchasedHandler,
};

pub const PROPERTY_REGISTRY_ADDRESS: &str = "0x8731d54E9D02c286767d56ac03e8037C07e01e98";
pub const TOKEN_SALE_ADDRESS: &str = "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984";

pub const PROPERTY_CREATED_ABI: &str =
    "PropertyCreated(uint256 indexed propertyId, address indexed owner, uint256 tokenPrice, uint256 totalTokens)";
pub const TOKENS_PURCHASED_ABI: &str =
    "TokensPurchased(uint256 indexed propertyId, address indexed buyer, uint256 amount)";

pub fn property_registry_contract(listings: &PropertyListings) -> Contract {
    Contract::new("PropertyRegistry", PROPERTY_REGISTRY_ADDRESS).add_handler(
        PropertyCreatedHandler {
            listings: listings.clone(),
        },
    )
}

pub fn token_sale_contract(holdings: &TokenHoldings) -> Contract {
    Contract::new("TokenSale", TOKEN_SALE_ADDRESS).add_handler(TokensPurchasedHandler {
        holdings: holdings.clone(),
    })
}

/// Registry contract whose purchase projection always fails, for
/// partial-failure tests.
pub fn property_registry_contract_with_failing_purchases(
    listings: &PropertyListings,
) -> Contract {
    Contract::new("PropertyRegistry", PROPERTY_REGISTRY_ADDRESS)
        .add_handler(PropertyCreatedHandler {
            listings: listings.clone(),
        })
        .add_handler(FailingTokensPurchasedHandler)
}
