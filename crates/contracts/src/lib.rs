//! # Contracts
//!
//! Frozen interface contracts shared by every lunarsensor crate.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Readings carry wall-clock Unix time in milliseconds, stamped when dispatched
//! - Feed sequence numbers (`Message::id`) are informational only

mod config;
mod error;
mod message;
mod sink;

pub use config::*;
pub use error::*;
pub use message::*;
pub use sink::*;
