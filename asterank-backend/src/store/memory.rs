//! In-memory document store.
//!
//! Holds every collection in process, seeded from `<collection>.json` files.
//! Used by the binary for local catalogs and by the tests as the store double.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use asterank_common::{Collection, Document, ID_FIELD};
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::filter::{compare_values, lookup_path, Filter};
use super::{DocumentStore, FindOptions, Projection, SortOrder, StoreError, StoreResult};

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from preloaded collections, assigning identities.
    pub fn from_collections(collections: HashMap<Collection, Vec<Document>>) -> Self {
        let collections = collections
            .into_iter()
            .map(|(name, docs)| (name, docs.into_iter().map(with_identity).collect()))
            .collect();
        Self {
            collections: Arc::new(RwLock::new(collections)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load every `<collection>.json` array found in `data_dir`.
    ///
    /// Missing files leave the collection empty.
    pub async fn load_from_dir(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        let mut collections = HashMap::new();

        for collection in Collection::ALL {
            let path = data_dir.join(format!("{}.json", collection.as_str()));
            if !path.exists() {
                debug!("Seed file does not exist: {:?}", path);
                continue;
            }

            let content = fs::read_to_string(&path).await?;
            let docs: Vec<Document> = serde_json::from_str(&content)?;
            info!("Loaded {} documents into {}", docs.len(), collection);
            collections.insert(collection, docs);
        }

        Ok(Self::from_collections(collections))
    }

    pub async fn seed(&self, collection: Collection, docs: impl IntoIterator<Item = Document>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .extend(docs.into_iter().map(with_identity));
    }

    pub async fn count(&self, collection: Collection) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map_or(0, Vec::len)
    }

    /// Make every subsequent operation fail, to exercise error paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::SeqCst)
    }
}

fn with_identity(mut doc: Document) -> Document {
    if !doc.contains_key(ID_FIELD) {
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(uuid::Uuid::now_v7().to_string()),
        );
    }
    doc
}

fn project(doc: &Document, projection: &Projection) -> Document {
    match projection {
        Projection::All => doc
            .iter()
            .filter(|(key, _)| key.as_str() != ID_FIELD)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Projection::Fields(fields) => fields
            .iter()
            .filter(|field| field.as_str() != ID_FIELD)
            .filter_map(|field| doc.get(field).map(|value| (field.clone(), value.clone())))
            .collect(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        if self.is_unavailable() {
            return Err(StoreError::Query {
                collection,
                message: "store unavailable".to_string(),
            });
        }

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = docs.iter().filter(|doc| filter.matches(doc)).collect();

        if let Some((field, order)) = &options.sort {
            matched.sort_by(|a, b| {
                let ordering = compare_values(lookup_path(a, field), lookup_path(b, field));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        let limit = options.limit.unwrap_or(usize::MAX);
        let results: Vec<Document> = matched
            .into_iter()
            .take(limit)
            .map(|doc| project(doc, &options.projection))
            .collect();

        debug!("find on {} returned {} documents", collection, results.len());
        Ok(results)
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> StoreResult<()> {
        if self.is_unavailable() {
            return Err(StoreError::Insert {
                collection,
                message: "store unavailable".to_string(),
            });
        }

        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .push(with_identity(document));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn sample_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(
                Collection::Asteroids,
                vec![
                    doc(json!({"prov_des": "A", "price": 3.0, "spec": "C"})),
                    doc(json!({"prov_des": "B", "price": 10.0, "spec": "S"})),
                    doc(json!({"prov_des": "C", "spec": "C"})),
                    doc(json!({"prov_des": "D", "price": 7.5, "spec": "C"})),
                ],
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_find_sorts_limits_and_hides_identity() {
        let store = sample_store().await;
        let options = FindOptions::new().sort("price", SortOrder::Descending).limit(3);

        let results = store
            .find(Collection::Asteroids, &Filter::new(), &options)
            .await
            .unwrap();

        let names: Vec<_> = results.iter().map(|d| d["prov_des"].clone()).collect();
        assert_eq!(names, vec![json!("B"), json!("D"), json!("A")]);
        assert!(results.iter().all(|d| !d.contains_key(ID_FIELD)));
    }

    #[tokio::test]
    async fn test_zero_limit_returns_everything() {
        let store = sample_store().await;
        let options = FindOptions::new().limit(0);

        let results = store
            .find(Collection::Asteroids, &Filter::new(), &options)
            .await
            .unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_projection_and_find_one() {
        let store = sample_store().await;
        let projection = Projection::fields(["prov_des", ID_FIELD, "missing"]);

        let found = store
            .find_one(Collection::Asteroids, &Filter::new().eq("spec", "S"), &projection)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(Value::Object(found), json!({"prov_des": "B"}));
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::UserObjects, doc(json!({"name": "x"})))
            .await
            .unwrap();

        assert_eq!(store.count(Collection::UserObjects).await, 1);
        let collections = store.collections.read().await;
        assert!(collections[&Collection::UserObjects][0].contains_key(ID_FIELD));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = sample_store().await;
        store.set_unavailable(true);

        let result = store
            .find(Collection::Asteroids, &Filter::new(), &FindOptions::new())
            .await;
        assert!(matches!(result, Err(StoreError::Query { .. })));

        let result = store.insert_one(Collection::Asteroids, Document::new()).await;
        assert!(matches!(result, Err(StoreError::Insert { .. })));
    }

    #[tokio::test]
    async fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("asteroids.json"),
            r#"[{"prov_des": "433", "full_name": "433 Eros"}]"#,
        )
        .unwrap();

        let store = MemoryStore::load_from_dir(temp_dir.path()).await.unwrap();
        assert_eq!(store.count(Collection::Asteroids).await, 1);
        assert_eq!(store.count(Collection::Ephemerides).await, 0);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_seed() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("exo.json"), "{not json").unwrap();

        let result = MemoryStore::load_from_dir(temp_dir.path()).await;
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }
}
