//! Typed views over the catalog collections.
//!
//! The datasets were ingested from sources that write an empty string where a
//! value is missing, so every numeric field goes through [`blank_as_none`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::Document;

/// Reads a numeric field that may be a number, a numeric string, a blank
/// string or null.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Asteroid catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CelestialObject {
    /// Provisional designation, unique within the catalog
    pub prov_des: String,

    pub full_name: String,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub e: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub i: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub om: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub ma: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub per: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub epoch: Option<f64>,

    /// Estimated value, exposed publicly as `value`
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    /// Accessibility score, exposed publicly as `accessibility`
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub closeness: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Any other stored columns (spectral type, physical parameters, ...)
    #[serde(flatten)]
    pub extra: Document,
}

impl CelestialObject {
    pub fn new(prov_des: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            prov_des: prov_des.into(),
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> Document {
        to_document(self)
    }
}

/// "Next pass" sub-record of an ephemeris entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NextPass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_iso: Option<String>,

    #[serde(flatten)]
    pub extra: Document,
}

/// Cached ephemeris lookup, keyed by designation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EphemerisRecord {
    #[serde(default)]
    pub tag_name: String,

    #[serde(rename = "Next Pass", default, skip_serializing_if = "Option::is_none")]
    pub next_pass: Option<NextPass>,

    #[serde(flatten)]
    pub data: Document,
}

impl EphemerisRecord {
    pub fn to_document(&self) -> Document {
        to_document(self)
    }
}

/// Raw exoplanet candidate as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExoplanetCandidate {
    #[serde(default)]
    pub kepoi_name: String,

    #[serde(default)]
    pub koi_disposition: Option<String>,
    #[serde(default)]
    pub koi_pdisposition: Option<String>,

    /// Semi-major axis (AU)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_sma: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_eccen: Option<f64>,
    /// Transit inclination (degrees)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_incl: Option<f64>,
    /// Longitude of periapsis (degrees)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_longp: Option<f64>,
    /// Transit period (days)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_period: Option<f64>,

    /// Planet radius (Earth radii)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_prad: Option<f64>,
    /// Equilibrium temperature (K)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_teq: Option<f64>,
    /// Stellar radius (solar radii)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_srad: Option<f64>,
    /// Stellar effective temperature (K)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_steff: Option<f64>,
    /// Stellar age (Gyr)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub koi_sage: Option<f64>,
}

impl ExoplanetCandidate {
    pub const FALSE_POSITIVE: &'static str = "FALSE POSITIVE";

    /// True when either disposition flag carries the false-positive label.
    pub fn is_false_positive(&self) -> bool {
        let flagged = |d: &Option<String>| d.as_deref() == Some(Self::FALSE_POSITIVE);
        flagged(&self.koi_disposition) || flagged(&self.koi_pdisposition)
    }
}

/// Orbital elements synthesized from an exoplanet candidate, using the
/// public field names of the asteroid catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOrbitalElement {
    pub full_name: String,
    pub prov_des: String,
    pub a: f64,
    pub e: f64,
    pub i: f64,
    pub w_bar: f64,
    /// Orbital period (days)
    #[serde(rename = "P")]
    pub period: f64,
    pub om: f64,
    pub ma: f64,
    pub epoch: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_age: Option<f64>,
}

/// Client-submitted object with its image storage keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserObject {
    #[serde(flatten)]
    pub fields: Document,

    #[serde(default)]
    pub s3_image_keys: Vec<String>,
}

impl UserObject {
    pub fn new(fields: Document, image_keys: Option<Vec<String>>) -> Self {
        Self {
            fields,
            s3_image_keys: image_keys.unwrap_or_default(),
        }
    }

    pub fn to_document(&self) -> Document {
        to_document(self)
    }
}

fn to_document<T: Serialize>(record: &T) -> Document {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Document::new(),
    }
}
