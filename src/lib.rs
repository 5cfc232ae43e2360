//! Parlor: core of a minimal chat front end.
//!
//! Sends each user prompt to a hosted model through an agent runtime, keeps
//! per-session conversation memory and renders history through a small
//! controller a UI can drive.
//!
//! # Quick Start
//!
//! ```no_run
//! use parlor::prelude::*;
//!
//! # fn main() -> parlor::error::Result<()> {
//! let mut chat = ChatController::from_config(ChatConfig::from_env())?;
//! let reply = chat.submit_prompt("What time is it?")?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
