//! `gigboard-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod timestamp;

pub use error::{DomainError, DomainResult};
pub use id::{JobId, NotificationId, RunId, UserId};
pub use timestamp::Timestamp;
