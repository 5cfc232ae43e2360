//! Core types for parlor.

pub mod generation;
pub mod message;
pub mod turn;
pub mod usage;

pub use generation::*;
pub use message::*;
pub use turn::*;
pub use usage::*;
