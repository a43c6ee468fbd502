use derive_more::Display;

use crate::events::{Event, EventParam};

/// Failure while applying an event to a projection. The scheduler logs it
/// with the event's identity and moves on to the next log in the batch.
#[derive(Debug, Display)]
#[display("handler error: {_0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::error::Error for HandlerError {}

#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    /// The human-readable ABI of the event being handled.
    /// For example:
    /// PropertyCreated(uint256 indexed propertyId, address indexed owner, uint256 tokenPrice, uint256 totalTokens)
    /// The chain explorer's event section can also be used to easily infer this
    fn abi(&self) -> &'static str;
    async fn handle_event(&self, context: EventContext<'_>) -> Result<(), HandlerError>;
}

/// Hands a handler the decoded event plus its block metadata. Handlers own
/// their projection write paths and must upsert idempotently: re-running
/// the same event twice leaves the projection in the same final state.
///
/// Handlers may assume in-order invocation within a single contract's
/// batch, never across contracts.
#[derive(Clone)]
pub struct EventContext<'a> {
    pub event: &'a Event,
}

impl<'a> EventContext<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }

    pub fn get_event_params(&self) -> EventParam {
        self.event.get_params()
    }
}
