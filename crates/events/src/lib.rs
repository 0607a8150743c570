//! Lending audit events and the bus they are published on.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod lending;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use lending::LendingEvent;
