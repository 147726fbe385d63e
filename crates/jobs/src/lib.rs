//! `gigboard-jobs` — job posting domain model.
//!
//! Pure domain crate: the four engagement variants, the lifecycle status
//! machine, and start-time resolution. No I/O, no storage assumptions.

pub mod posting;
pub mod resolver;

pub use posting::{
    ActiveJob, AuctionStart, ClockTime, JobKind, JobStatus, JobVariant, StagedJob,
};
pub use resolver::resolve_start;
