//! mcp-chat: terminal chat with an Anthropic model that can call the tools of
//! a local MCP server.
//!
//! A [`agent::ChatSession`] launches the server script as a child process,
//! discovers its tools and answers each query by looping between the model
//! and tool calls until the model replies without requesting a tool.
//!
//! # Quick Start
//!
//! ```no_run
//! use mcp_chat::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> mcp_chat::error::Result<()> {
//! let config = ChatConfig::load(None)?;
//! let mut session = ChatSession::connect("weather_server.py", &config).await?;
//! let outcome = session
//!     .process_query("What's the forecast for Sacramento?", &CancellationToken::new())
//!     .await?;
//! println!("{}", outcome.answer);
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
