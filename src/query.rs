//! Query planning: structured filters and the search algorithm.

pub mod filter;
pub mod planner;

pub use filter::FilterSet;
pub use planner::{execute, Hit, QueryPlan};
