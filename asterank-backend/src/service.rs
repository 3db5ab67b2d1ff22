//! Public operations of the Asterank core, bound to one store and one
//! ephemeris source.
use std::sync::Arc;

use asterank_common::{DerivedOrbitalElement, Document};
use serde_json::Value;
use tracing::info;

use crate::error::CoreResult;
use crate::module::ephemeris::{EphemerisGateway, EphemerisSource};
use crate::module::rankings::Ranking;
use crate::module::{autocomplete, catalog, exoplanets, rankings};
use crate::store::DocumentStore;

pub struct AsterankService {
    store: Arc<dyn DocumentStore>,
    gateway: EphemerisGateway,
    max_limit: usize,
}

impl AsterankService {
    pub fn new(store: Arc<dyn DocumentStore>, source: Arc<dyn EphemerisSource>, max_limit: usize) -> Self {
        info!("Asterank service ready, limits capped at {}", max_limit);
        Self {
            gateway: EphemerisGateway::new(store.clone(), source),
            store,
            max_limit,
        }
    }

    /// Cap a caller's limit at `max_limit`; 0 asks for as many as allowed.
    fn clamp(&self, limit: usize) -> usize {
        if limit == 0 {
            self.max_limit
        } else {
            limit.min(self.max_limit)
        }
    }

    /// `Ok(None)` when `criterion` names no ranking.
    pub async fn rankings(&self, criterion: &str, limit: usize, orbits_only: bool) -> CoreResult<Option<Ranking>> {
        rankings::rankings(self.store.as_ref(), criterion, self.clamp(limit), orbits_only).await
    }

    pub async fn autocomplete(&self, query: &str, limit: usize) -> CoreResult<Vec<Document>> {
        autocomplete::autocomplete(self.store.as_ref(), query, self.clamp(limit)).await
    }

    /// Cached ephemeris for `designation`; `Ok(None)` when it cannot be computed.
    pub async fn jpl_lookup(&self, designation: &str) -> CoreResult<Option<Document>> {
        self.gateway.lookup(designation).await
    }

    pub async fn exoplanets(&self, query: &Document, limit: usize) -> CoreResult<Vec<DerivedOrbitalElement>> {
        exoplanets::derive_exoplanet_orbits(self.store.as_ref(), query, self.clamp(limit)).await
    }

    pub async fn mpc(&self, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
        catalog::mpc(self.store.as_ref(), query, self.clamp(limit)).await
    }

    pub async fn kepler(&self, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
        catalog::kepler(self.store.as_ref(), query, self.clamp(limit)).await
    }

    pub async fn asterank(&self, query: &Value, limit: usize) -> CoreResult<Vec<Document>> {
        catalog::asterank(self.store.as_ref(), query, self.clamp(limit)).await
    }

    pub async fn insert_user_object(&self, object: Document, image_keys: Option<Vec<String>>) -> CoreResult<Value> {
        catalog::insert_user_object(self.store.as_ref(), object, image_keys).await
    }

    pub async fn user_objects(&self, limit: usize) -> CoreResult<Vec<Document>> {
        catalog::user_objects(self.store.as_ref(), self.clamp(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use asterank_common::{CelestialObject, Collection};
    use async_trait::async_trait;
    use serde_json::json;

    struct NoSource;

    #[async_trait]
    impl EphemerisSource for NoSource {
        async fn compute(&self, designation: &str) -> anyhow::Result<Document> {
            anyhow::bail!("offline: {}", designation)
        }
    }

    async fn service(max_limit: usize) -> AsterankService {
        let store = MemoryStore::new();
        let docs = (0..20).map(|n| {
            let mut object = CelestialObject::new(format!("{}", n), format!("{} Rock", n));
            object.price = Some(n as f64);
            object.to_document()
        });
        store.seed(Collection::Asteroids, docs).await;
        AsterankService::new(Arc::new(store), Arc::new(NoSource), max_limit)
    }

    #[tokio::test]
    async fn test_limits_are_clamped() {
        let service = service(5).await;

        let ranked = service.rankings("value", 100, false).await.unwrap().unwrap();
        assert_eq!(ranked.len(), 5);

        let found = service.asterank(&json!({}), 100).await.unwrap();
        assert_eq!(found.len(), 5);

        let found = service.autocomplete("Rock", 100).await.unwrap();
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_limit_below_cap_is_kept() {
        let service = service(1000).await;
        let ranked = service.rankings("value", 3, false).await.unwrap().unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].as_ref().unwrap()["price"], json!(19.0));
    }

    #[tokio::test]
    async fn test_zero_limit_means_up_to_the_cap() {
        let capped = service(8).await;

        let ranked = capped.rankings("value", 0, false).await.unwrap().unwrap();
        assert_eq!(ranked.len(), 8);

        let found = capped.asterank(&json!({}), 0).await.unwrap();
        assert_eq!(found.len(), 8);

        let uncapped = service(1000).await;
        let found = uncapped.autocomplete("Rock", 0).await.unwrap();
        assert_eq!(found.len(), 20);
    }

    #[tokio::test]
    async fn test_unknown_ranking_and_uncomputable_ephemeris() {
        let service = service(1000).await;
        assert!(service.rankings("bogus", 10, false).await.unwrap().is_none());
        assert!(service.jpl_lookup("433").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_objects_through_service() {
        let service = service(1000).await;
        let object = json!({"name": "mine"}).as_object().cloned().unwrap();

        service.insert_user_object(object, None).await.unwrap();
        let stored = service.user_objects(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["name"], json!("mine"));
    }
}
