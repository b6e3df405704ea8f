//! Listener registries, the callback execution context and the event router.

pub mod executor;
pub mod registry;
pub mod router;

pub use executor::CallbackExecutor;
pub use registry::{Listener, ListenerRegistry, Listeners};
pub use router::EventRouter;
