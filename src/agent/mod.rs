//! Chat session over a tool provider and a model gateway.

pub mod session;

pub use session::ChatSession;
