//! Navigable contexts and the registry that owns them.

mod navigable;
pub mod print;
mod registry;
pub mod signal;
mod target;

pub use navigable::NavigableContext;
pub use registry::ContextRegistry;
pub use signal::{Deferred, SignalError, SignalState, Waiter};
pub use target::CdpTarget;
