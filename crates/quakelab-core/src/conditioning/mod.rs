//! Baseline correction and zero-phase filtering. Both operations leave the
//! input record untouched and return a new series on the same time base.

mod detrend;
mod filter;

pub use detrend::{detrend, DetrendMethod};
pub use filter::{filter, Butterworth, FilterKind, FilterSpec};
