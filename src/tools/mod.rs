//! Tool discovery and invocation on top of a tool provider.

pub mod invoker;
pub mod provider;
pub mod registry;

pub use invoker::{RegistryInvoker, ToolInvoker};
pub use provider::ToolProvider;
pub use registry::ToolRegistry;
