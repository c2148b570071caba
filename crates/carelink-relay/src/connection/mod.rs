//! Connection lifecycle: handles and the registry.

pub mod handle;
pub mod registry;
