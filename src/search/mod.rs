//! Search Module
//!
//! Structured product search through SerpAPI (Google Shopping engine).

pub mod serpapi;

pub use serpapi::{parse_shopping_results, SearchError, SerpApiClient};
