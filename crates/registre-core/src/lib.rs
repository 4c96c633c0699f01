//! Core domain logic for the registre time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Records: the tracked intervals and their lifecycle helpers
//! - Periods: calendar buckets (day, ISO week, month) addressed by offset
//! - Reporting: per-project aggregation of closed intervals

pub mod period;
pub mod record;
pub mod report;
pub mod types;

pub use period::{Bucket, Period, UnknownPeriod, YearMonth};
pub use record::{Record, now};
pub use report::{ProjectTotal, aggregate, grand_total};
pub use types::{ProjectName, ValidationError};
