//! Market events and the bus that distributes them.
//!
//! Events are published *after* the state change they describe has been
//! committed by the store. The bus is distribution only; it never persists.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, PublishError, Subscription};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
