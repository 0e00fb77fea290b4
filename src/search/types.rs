use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One hit returned by the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    /// Provider relevance score; higher is more relevant.
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// Hits for a single keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQueryResult {
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Full provider response for one multi-keyword request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchQueryResult>,
    /// Combined answer synthesized by the provider, if it produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Per-keyword failures reported by the provider.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl SearchResponse {
    /// Total number of hits across all keywords
    pub fn total_results(&self) -> usize {
        self.results.iter().map(|q| q.results.len()).sum()
    }

    /// All hits across keywords, deduplicated by URL
    pub fn unique_results(&self) -> Vec<SearchResult> {
        dedupe_by_url(
            self.results
                .iter()
                .flat_map(|q| q.results.iter().cloned()),
        )
    }
}

/// Collapse results sharing a URL, keeping the highest-scoring entry.
///
/// Output keeps the position where each URL was first seen. On equal scores
/// the earlier entry wins.
pub fn dedupe_by_url(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<SearchResult> = Vec::new();

    for result in results {
        match positions.get(&result.url) {
            Some(&idx) => {
                if result.score > unique[idx].score {
                    unique[idx] = result;
                }
            }
            None => {
                positions.insert(result.url.clone(), unique.len());
                unique.push(result);
            }
        }
    }

    unique
}
