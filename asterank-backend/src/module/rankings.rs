//! Asteroid rankings and the upcoming close-approach listing.

use std::collections::HashSet;

use asterank_common::{Collection, Document, RankingCriterion};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::fields::ranking_field;
use crate::error::CoreResult;
use crate::store::{Condition, DocumentStore, Filter, FindOptions, Projection, SortOrder};

/// Fields returned when only orbits are requested
pub const ORBIT_FIELDS: &[&str] = &[
    "prov_des", "full_name", "price", "profit", "a", "e", "i", "om", "ma", "n", "w", "per",
    "epoch",
];

/// Number of upcoming passes considered before de-duplication
pub const UPCOMING_WINDOW: usize = 30;

pub const NEXT_PASS_FIELD: &str = "Next Pass";
pub const NEXT_PASS_DATE_FIELD: &str = "Next Pass.date_iso";

/// Ranked objects. Upcoming passes may contain holes where the ephemeris
/// designation has no catalog entry.
pub type Ranking = Vec<Option<Document>>;

/// Rank asteroids by a public criterion name.
///
/// Returns `Ok(None)` when `criterion` is not a known ranking.
pub async fn rankings(
    store: &dyn DocumentStore,
    criterion: &str,
    limit: usize,
    orbits_only: bool,
) -> CoreResult<Option<Ranking>> {
    let Ok(criterion) = criterion.parse::<RankingCriterion>() else {
        debug!("Unknown ranking requested: {:?}", criterion);
        return Ok(None);
    };
    rank_by(store, criterion, limit, orbits_only).await.map(Some)
}

pub async fn rank_by(
    store: &dyn DocumentStore,
    criterion: RankingCriterion,
    limit: usize,
    orbits_only: bool,
) -> CoreResult<Ranking> {
    let Some(sort_field) = ranking_field(criterion) else {
        return upcoming_passes(store, Utc::now()).await;
    };

    let projection = if orbits_only {
        Projection::fields(ORBIT_FIELDS.iter().copied())
    } else {
        Projection::All
    };
    let options = FindOptions::new()
        .projection(projection)
        .sort(sort_field, SortOrder::Descending)
        .limit(limit);

    let results = store
        .find(Collection::Asteroids, &Filter::new(), &options)
        .await?;

    Ok(results.into_iter().map(strip_blank).map(Some).collect())
}

/// Catalog objects with the soonest close approaches after `now`, one entry
/// per designation, soonest pass first.
pub async fn upcoming_passes(store: &dyn DocumentStore, now: DateTime<Utc>) -> CoreResult<Ranking> {
    let now_iso = now.format("%Y-%m-%dT%H:%M:%S").to_string();
    let filter = Filter::new()
        .with(NEXT_PASS_FIELD, Condition::Exists(true))
        .with(NEXT_PASS_FIELD, Condition::Ne(Value::Null))
        .with(NEXT_PASS_DATE_FIELD, Condition::Gte(Value::String(now_iso)));
    let options = FindOptions::new()
        .projection(Projection::fields(["tag_name", NEXT_PASS_FIELD]))
        .sort(NEXT_PASS_DATE_FIELD, SortOrder::Ascending)
        .limit(UPCOMING_WINDOW);

    let passes = store.find(Collection::Ephemerides, &filter, &options).await?;

    let mut seen = HashSet::new();
    let mut designations = Vec::new();
    for pass in &passes {
        let Some(tag_name) = pass.get("tag_name").and_then(Value::as_str) else {
            warn!("Ephemeris record without a designation skipped");
            continue;
        };
        if seen.insert(tag_name.to_string()) {
            designations.push(tag_name.to_string());
        }
    }

    let lookups = designations.iter().map(|designation| {
        let filter = Filter::new().eq("prov_des", designation.as_str());
        async move {
            store
                .find_one(Collection::Asteroids, &filter, &Projection::All)
                .await
        }
    });
    let objects = try_join_all(lookups).await?;

    let missing = objects.iter().filter(|o| o.is_none()).count();
    if missing > 0 {
        debug!("{} upcoming passes have no catalog entry", missing);
    }
    Ok(objects)
}

/// Empty strings mark missing values in the catalog; drop them.
fn strip_blank(doc: Document) -> Document {
    doc.into_iter()
        .filter(|(_, value)| value.as_str() != Some(""))
        .collect()
}
