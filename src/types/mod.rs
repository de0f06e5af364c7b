//! Core types for mcp-chat.

pub mod message;
pub mod tool;
pub mod turn;
pub mod usage;

pub use message::*;
pub use tool::*;
pub use turn::*;
pub use usage::*;
