//! The three searches over modification combinations.
//!
//! Each search is a value built from its inputs and consumed by `run`, so a search
//! object goes from idle to done exactly once. All three iterate over explicit
//! stacks or worklists.

pub mod enumerate;
pub mod improved;
pub mod model;
pub mod peakwise;
