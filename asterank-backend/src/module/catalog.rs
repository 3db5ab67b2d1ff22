//! Free-form catalog queries and user-submitted objects.
use asterank_common::{Collection, Document, UserObject};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::store::{DocumentStore, Filter, FindOptions};

/// Run a public filter object against one collection, as stored.
pub async fn query_collection(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &Value,
    limit: usize,
) -> CoreResult<Vec<Document>> {
    let filter = Filter::from_query(query).map_err(CoreError::InvalidInput)?;
    let results = store
        .find(collection, &filter, &FindOptions::new().limit(limit))
        .await?;
    debug!("Query on {} returned {} records", collection, results.len());
    Ok(results)
}

/// Minor Planet Center catalog
pub async fn mpc(store: &dyn DocumentStore, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
    query_collection(store, Collection::Mpc, query, limit).await
}

/// Kepler catalog
pub async fn kepler(store: &dyn DocumentStore, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
    query_collection(store, Collection::Kepler, query, limit).await
}

/// Asteroid catalog, without ranking
pub async fn asterank(store: &dyn DocumentStore, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
    query_collection(store, Collection::Asteroids, query, limit).await
}

pub async fn insert_user_object(
    store: &dyn DocumentStore,
    object: Document,
    image_keys: Option<Vec<String>>,
) -> CoreResult<Value> {
    let object = UserObject::new(object, image_keys);
    info!(
        "Storing user object with {} image keys",
        object.s3_image_keys.len()
    );
    store
        .insert_one(Collection::UserObjects, object.to_document())
        .await?;
    Ok(json!({ "success": true }))
}

pub async fn user_objects(store: &dyn DocumentStore, limit: usize) -> CoreResult<Vec<Document>> {
    let results = store
        .find(Collection::UserObjects, &Filter::new(), &FindOptions::new().limit(limit))
        .await?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_queries_hit_their_own_collection() {
        let store = MemoryStore::new();
        store
            .seed(Collection::Mpc, vec![doc(json!({"des": "K10A00B", "H": 21.3}))])
            .await;
        store
            .seed(Collection::Kepler, vec![doc(json!({"kepid": 757076, "H": 21.3}))])
            .await;

        let found = mpc(&store, &json!({"H": 21.3}), 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["des"], json!("K10A00B"));

        let found = kepler(&store, &json!({}), 10).await.unwrap();
        assert_eq!(found[0]["kepid"], json!(757076));

        assert!(asterank(&store, &json!({}), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_limit_and_regex() {
        let store = MemoryStore::new();
        let docs = (0..5).map(|n| doc(json!({"full_name": format!("({}) Roid", n), "spec": "C"})));
        store.seed(Collection::Asteroids, docs).await;

        let found = asterank(&store, &json!({"spec": "C"}), 3).await.unwrap();
        assert_eq!(found.len(), 3);

        let query = json!({"full_name": {"$regex": "^\\(4\\)"}});
        let found = asterank(&store, &query, 10).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let store = MemoryStore::new();
        let result = mpc(&store, &json!("not a query"), 10).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_user_objects_round_trip() {
        let store = MemoryStore::new();

        let response = insert_user_object(&store, doc(json!({"name": "mine"})), None)
            .await
            .unwrap();
        assert_eq!(response, json!({"success": true}));

        insert_user_object(
            &store,
            doc(json!({"name": "with images"})),
            Some(vec!["abc.png".to_string()]),
        )
        .await
        .unwrap();

        let stored = user_objects(&store, 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["s3_image_keys"], json!([]));
        assert_eq!(stored[1]["s3_image_keys"], json!(["abc.png"]));
        assert!(stored.iter().all(|d| !d.contains_key("_id")));
    }

    #[tokio::test]
    async fn test_insert_failure_is_reported() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = insert_user_object(&store, Document::new(), None).await;
        assert!(matches!(result, Err(CoreError::Store(_))));
    }
}
