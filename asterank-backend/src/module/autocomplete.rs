//! Name completion over the asteroid catalog.
use asterank_common::{Collection, Document};
use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::store::{Condition, DocumentStore, Filter, FindOptions, Projection};

/// Objects whose full name contains `query`, case-insensitively.
///
/// Results are ordered by where the query first appears in the name. This is
/// close to "prefix matches first" but penalizes names that start with a long
/// catalog number.
pub async fn autocomplete(
    store: &dyn DocumentStore,
    query: &str,
    limit: usize,
) -> CoreResult<Vec<Document>> {
    let query = normalize_query(query);
    let regex = RegexBuilder::new(&regex::escape(&query))
        .case_insensitive(true)
        .build()
        .map_err(|e| CoreError::InvalidInput(format!("Bad search text {:?}: {}", query, e)))?;

    let filter = Filter::new().with("full_name", Condition::Regex(regex));
    let options = FindOptions::new().projection(Projection::All).limit(limit);
    let mut results = store.find(Collection::Asteroids, &filter, &options).await?;

    let needle = query.to_lowercase();
    results.sort_by_key(|doc| match_position(doc, &needle));

    debug!("Autocomplete '{}' found {} results", query, results.len());
    Ok(results)
}

/// Undo the `+`-for-space encoding used by the search box.
pub fn normalize_query(query: &str) -> String {
    query.replace('+', " ")
}

fn match_position(doc: &Document, needle: &str) -> usize {
    doc.get("full_name")
        .and_then(Value::as_str)
        .and_then(|name| name.to_lowercase().find(needle))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use asterank_common::CelestialObject;

    async fn catalog(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let docs = names
            .iter()
            .enumerate()
            .map(|(n, name)| CelestialObject::new(n.to_string(), *name).to_document());
        store.seed(Collection::Asteroids, docs).await;
        store
    }

    fn names(results: &[Document]) -> Vec<&str> {
        results.iter().map(|d| d["full_name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_substring_match() {
        let store = catalog(&["433 Eros", "1566 Icarus"]).await;
        let results = autocomplete(&store, "Eros", 10).await.unwrap();
        assert_eq!(names(&results), vec!["433 Eros"]);
    }

    #[tokio::test]
    async fn test_case_insensitive() {
        let store = catalog(&["433 Eros", "1566 Icarus"]).await;
        let results = autocomplete(&store, "icARus", 10).await.unwrap();
        assert_eq!(names(&results), vec!["1566 Icarus"]);
    }

    #[tokio::test]
    async fn test_earlier_match_sorts_first() {
        let store = catalog(&["(2010 AB) 2", "2010 AB"]).await;
        let results = autocomplete(&store, "2010", 10).await.unwrap();
        assert_eq!(names(&results), vec!["2010 AB", "(2010 AB) 2"]);
    }

    #[tokio::test]
    async fn test_plus_means_space() {
        let store = catalog(&["2010 AB", "2010 AC", "12010 ABC"]).await;
        let results = autocomplete(&store, "2010+AB", 10).await.unwrap();
        assert_eq!(names(&results), vec!["2010 AB", "12010 ABC"]);
    }

    #[tokio::test]
    async fn test_limit_and_literal_query() {
        let store = catalog(&["(1) Ceres", "(2) Pallas", "(3) Juno"]).await;

        let results = autocomplete(&store, "(", 2).await.unwrap();
        assert_eq!(results.len(), 2);

        let results = autocomplete(&store, ".*", 10).await.unwrap();
        assert!(results.is_empty());
    }
}
