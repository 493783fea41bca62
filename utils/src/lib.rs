//! Leverage common data structures across the postal simulation.
//!
//! # Status
//!
//! `postal-utils` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod priority_queue;
pub use priority_queue::{Comparator, PriorityQueue};
