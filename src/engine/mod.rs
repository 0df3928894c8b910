//! Background engine.
//!
//! The refresh loop: reads the store, recomputes derived profit and
//! republishes the caches on a fixed interval.

pub mod refresher;

pub use refresher::{CycleReport, ErrorPolicy, Refresher, REFRESH_INTERVAL};
