//! Orbital elements for exoplanet candidates.
//!
//! The candidate catalog stores transit measurements, not orbits. Each record
//! is projected onto the asteroid catalog's element names, given a period from
//! Kepler's third law and filled with Earth-like defaults where values are
//! unset, so the candidates can be drawn next to solar-system bodies.

use asterank_common::{Collection, DerivedOrbitalElement, Document, ExoplanetCandidate};
use serde_json::Value;
use tracing::{debug, warn};

use super::fields::EXOPLANET_FIELDS;
use crate::error::{CoreError, CoreResult};
use crate::store::{DocumentStore, Filter, FindOptions, SortOrder};

/// J2000 epoch (Julian date)
pub const J2000: f64 = 2451545.0;

pub const DAYS_PER_YEAR: f64 = 365.25;

/// Transit inclination is measured from the sky plane, orbital inclination
/// from the reference plane.
pub const INCLINATION_OFFSET_DEG: f64 = 90.0;

pub const DEFAULT_ECCENTRICITY: f64 = 0.01671122945845127;
pub const DEFAULT_INCLINATION: f64 = 0.0;
pub const DEFAULT_LONGITUDE_OF_PERIAPSIS: f64 = 102.93768193;
pub const DEFAULT_MEAN_ANOMALY: f64 = -2.4731102699999923;
pub const DEFAULT_ASCENDING_NODE: f64 = 0.0;

/// Which synthesized values count as unset and get a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsetPolicy {
    /// Only missing or blank values
    MissingOrBlank,
    /// Missing, blank, or exactly zero. A genuine zero (a circular orbit) is
    /// indistinguishable from an unset value under this policy.
    MissingBlankOrZero,
}

pub const DEFAULT_FILL_POLICY: UnsetPolicy = UnsetPolicy::MissingBlankOrZero;

impl UnsetPolicy {
    fn is_unset(self, value: Option<f64>) -> bool {
        match (self, value) {
            (_, None) => true,
            (UnsetPolicy::MissingBlankOrZero, Some(v)) => v == 0.0,
            (UnsetPolicy::MissingOrBlank, Some(_)) => false,
        }
    }

    fn fill(self, value: Option<f64>, default: f64) -> f64 {
        match value {
            Some(v) if !self.is_unset(Some(v)) => v,
            _ => default,
        }
    }
}

/// Period in days of an orbit with semi-major axis `a` (AU) around a
/// solar-mass star.
pub fn orbital_period_days(a: f64) -> f64 {
    (a.powi(3)).sqrt() * DAYS_PER_YEAR
}

/// Derive orbital elements for the false-positive-flagged candidates that
/// match `query` (public field names), largest semi-major axis first.
pub async fn derive_exoplanet_orbits(
    store: &dyn DocumentStore,
    query: &Document,
    limit: usize,
) -> CoreResult<Vec<DerivedOrbitalElement>> {
    let translated = EXOPLANET_FIELDS.translate_query(query);
    let filter = Filter::from_query(&Value::Object(translated)).map_err(CoreError::InvalidInput)?;
    let options = FindOptions::new().sort("koi_sma", SortOrder::Descending);

    let records = store.find(Collection::Exoplanets, &filter, &options).await?;
    debug!("{} exoplanet candidates matched", records.len());

    let derived = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<ExoplanetCandidate>(Value::Object(record)) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!("Skipping unreadable exoplanet candidate: {}", e);
                None
            }
        })
        .filter(ExoplanetCandidate::is_false_positive)
        .filter_map(|candidate| synthesize(&candidate, DEFAULT_FILL_POLICY))
        .take(if limit == 0 { usize::MAX } else { limit })
        .collect();

    Ok(derived)
}

/// Build the derived element set for one candidate.
///
/// Returns `None` when the candidate has no usable semi-major axis.
pub fn synthesize(candidate: &ExoplanetCandidate, policy: UnsetPolicy) -> Option<DerivedOrbitalElement> {
    let Some(a) = candidate.koi_sma else {
        warn!("Candidate {} has no semi-major axis, skipped", candidate.kepoi_name);
        return None;
    };

    let inclination = candidate.koi_incl.map(|i| i - INCLINATION_OFFSET_DEG);

    Some(DerivedOrbitalElement {
        full_name: candidate.kepoi_name.clone(),
        prov_des: candidate.kepoi_name.clone(),
        a,
        e: policy.fill(candidate.koi_eccen, DEFAULT_ECCENTRICITY),
        i: policy.fill(inclination, DEFAULT_INCLINATION),
        w_bar: policy.fill(candidate.koi_longp, DEFAULT_LONGITUDE_OF_PERIAPSIS),
        // the stored transit period is replaced by the orbital one
        period: orbital_period_days(a),
        om: policy.fill(Some(0.0), DEFAULT_ASCENDING_NODE),
        ma: policy.fill(Some(0.0), DEFAULT_MEAN_ANOMALY),
        epoch: J2000,
        p_radius: candidate.koi_prad,
        p_temp: candidate.koi_teq,
        s_radius: candidate.koi_srad,
        s_temp: candidate.koi_steff,
        s_age: candidate.koi_sage,
    })
}
