//! Attendance rules: badge scan toggling, leave request lifecycle, and reporting.
//!
//! Everything here is stateless and works against a [`RecordStore`](crate::store::RecordStore);
//! callers pass the current time in so day and month boundaries are explicit.

pub mod aggregator;
pub mod lifecycle;
pub mod resolver;
