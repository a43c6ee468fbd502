mod event;

pub use event::{Event, EventDecodeError, EventParam};
