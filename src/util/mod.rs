//! Utility modules: retry, timeout and cancellation.

pub mod retry;
pub mod timeout;
