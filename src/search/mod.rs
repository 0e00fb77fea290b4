//! Multi-keyword web search client and result deduplication.

mod client;
mod types;

pub use client::SearchClient;
pub use types::{dedupe_by_url, SearchQueryResult, SearchResponse, SearchResult};
