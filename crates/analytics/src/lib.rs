//! `gigboard-analytics` — append-only rollup records and the pure windowed
//! computations behind them.

pub mod rollup;

pub use rollup::{daily_snapshot, weekly_report, DailySnapshot, VariantCounts, WeeklyReport};
