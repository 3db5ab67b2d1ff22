//! Read-through cache over the ephemeris collection.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use asterank_common::{Collection, Document, ID_FIELD};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::store::{DocumentStore, Filter, Projection};

/// Field holding the designation a cached record was computed for
pub const KEY_FIELD: &str = "tag_name";

/// Slow external computation of an ephemeris for a designation
#[async_trait]
pub trait EphemerisSource: Send + Sync {
    async fn compute(&self, designation: &str) -> anyhow::Result<Document>;
}

/// Look `designation` up in the cache, computing and storing it on a miss.
///
/// A failed computation yields `Ok(None)`; only store failures are errors.
/// Concurrent misses for the same designation both compute and insert; use
/// [`EphemerisGateway`] to coordinate them.
pub async fn lookup(
    designation: &str,
    store: &dyn DocumentStore,
    source: &dyn EphemerisSource,
) -> CoreResult<Option<Document>> {
    let filter = Filter::new().eq(KEY_FIELD, designation);
    if let Some(cached) = store
        .find_one(Collection::Ephemerides, &filter, &Projection::All)
        .await?
    {
        info!("Ephemeris lookup: {} found in cache", designation);
        return Ok(Some(strip_key(cached)));
    }

    info!("Ephemeris lookup: {} not found in cache", designation);
    let mut computed = match source.compute(designation).await {
        Ok(computed) => computed,
        Err(e) => {
            warn!("Ephemeris lookup: {} failed: {:#}", designation, e);
            return Ok(None);
        }
    };

    computed.remove(ID_FIELD);
    computed.insert(KEY_FIELD.to_string(), Value::String(designation.to_string()));
    store
        .insert_one(Collection::Ephemerides, computed.clone())
        .await?;
    info!("Ephemeris lookup: {} computed and cached", designation);

    Ok(Some(strip_key(computed)))
}

fn strip_key(mut record: Document) -> Document {
    record.remove(KEY_FIELD);
    record
}

/// Cache gateway that lets only one lookup per designation run at a time, so
/// concurrent misses compute once and later callers read the cached record.
pub struct EphemerisGateway {
    store: Arc<dyn DocumentStore>,
    source: Arc<dyn EphemerisSource>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl EphemerisGateway {
    pub fn new(store: Arc<dyn DocumentStore>, source: Arc<dyn EphemerisSource>) -> Self {
        Self {
            store,
            source,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lookup(&self, designation: &str) -> CoreResult<Option<Document>> {
        let slot = self.acquire(designation);
        let _guard = slot.key_lock.lock().await;
        lookup(designation, self.store.as_ref(), self.source.as_ref()).await
    }

    fn acquire<'a>(&'a self, designation: &'a str) -> InFlightSlot<'a> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let key_lock = in_flight
            .entry(designation.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        InFlightSlot {
            gateway: self,
            designation,
            key_lock,
        }
    }

    /// Drop the table entry once no other lookup holds it.
    fn release(&self, designation: &str, key_lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let is_last = in_flight
            .get(designation)
            .is_some_and(|entry| Arc::ptr_eq(entry, key_lock) && Arc::strong_count(key_lock) <= 2);
        if is_last {
            in_flight.remove(designation);
            debug!("Released lookup slot for {}", designation);
        }
    }
}

/// A lookup's claim on its designation's lock. Released on drop, so a
/// cancelled lookup gives its entry back too.
struct InFlightSlot<'a> {
    gateway: &'a EphemerisGateway,
    designation: &'a str,
    key_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.gateway.release(self.designation, &self.key_lock);
    }
}
