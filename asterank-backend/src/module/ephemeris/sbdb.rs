//! JPL Small-Body Database client used to compute missing ephemerides
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use asterank_common::records::blank_as_none;
use asterank_common::{Document, EphemerisRecord, NextPass};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::gateway::EphemerisSource;
use crate::config::EphemerisConfig;

/// SBDB close-approach dates look like `2029-Apr-13 21:46`
const SBDB_DATE_FORMAT: &str = "%Y-%b-%d %H:%M";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct SbdbResponse {
    #[serde(default)]
    pub object: Option<SbdbObject>,
    #[serde(default)]
    pub orbit: Option<SbdbOrbit>,
    #[serde(default)]
    pub ca_data: Vec<SbdbApproach>,
    /// Set instead of `object` when the search string was not found or was
    /// ambiguous
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SbdbObject {
    pub fullname: String,
    pub des: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub neo: Option<bool>,
    #[serde(default)]
    pub pha: Option<bool>,
    #[serde(default)]
    pub orbit_class: Option<OrbitClass>,
}

#[derive(Debug, Deserialize)]
pub struct OrbitClass {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SbdbOrbit {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub epoch: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub moid: Option<f64>,
    #[serde(default)]
    pub elements: Vec<SbdbElement>,
}

#[derive(Debug, Deserialize)]
pub struct SbdbElement {
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SbdbApproach {
    /// Close-approach time (TDB)
    pub cd: String,
    /// Nominal distance (AU)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub dist: Option<f64>,
    /// Relative velocity (km/s)
    #[serde(default, deserialize_with = "blank_as_none")]
    pub v_rel: Option<f64>,
    #[serde(default)]
    pub body: Option<String>,
}

/// HTTP client for the SBDB API
pub struct SbdbClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl SbdbClient {
    pub fn new(config: &EphemerisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        })
    }

    fn request_url(&self, designation: &str) -> String {
        format!(
            "{}?sstr={}&ca-data=1&ca-body=Earth",
            self.base_url,
            urlencoding::encode(designation)
        )
    }

    /// Fetch the SBDB record for `designation`, retrying transport failures.
    pub async fn fetch(&self, designation: &str) -> Result<SbdbResponse> {
        let url = self.request_url(designation);

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let delay = self.retry_delay * attempt;
                tracing::debug!(
                    "Retrying {} after {:?} (attempt {}/{})",
                    designation,
                    delay,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_attempt(&url, designation).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt == self.max_retries => {
                    tracing::error!(
                        "Failed to fetch {} after {} attempts: {:#}",
                        designation,
                        self.max_retries,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {:#}",
                        attempt,
                        self.max_retries,
                        designation,
                        e
                    );
                }
            }
        }

        Err(anyhow::anyhow!(
            "Failed to fetch {} after {} attempts",
            designation,
            self.max_retries
        ))
    }

    async fn fetch_attempt(&self, url: &str, designation: &str) -> Result<SbdbResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request for {}", designation))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP error {} for {}",
                response.status(),
                designation
            ));
        }

        response
            .json::<SbdbResponse>()
            .await
            .with_context(|| format!("Failed to parse JSON response for {}", designation))
    }
}

#[async_trait]
impl EphemerisSource for SbdbClient {
    async fn compute(&self, designation: &str) -> Result<Document> {
        let response = self.fetch(designation).await?;
        to_ephemeris(designation, response, Utc::now())
    }
}

/// Turn an SBDB response into a cacheable ephemeris record.
///
/// The next pass is the first Earth close approach at or after `now`.
pub fn to_ephemeris(designation: &str, response: SbdbResponse, now: DateTime<Utc>) -> Result<Document> {
    let Some(object) = response.object else {
        let reason = response.message.unwrap_or_else(|| "no object in response".to_string());
        anyhow::bail!("SBDB lookup for {} failed: {}", designation, reason);
    };

    let mut data = Document::new();
    data.insert("fullname".to_string(), json!(object.fullname));
    data.insert("des".to_string(), json!(object.des));
    if let Some(kind) = object.kind {
        data.insert("kind".to_string(), json!(kind));
    }
    if let Some(neo) = object.neo {
        data.insert("neo".to_string(), json!(neo));
    }
    if let Some(pha) = object.pha {
        data.insert("pha".to_string(), json!(pha));
    }
    if let Some(class) = object.orbit_class {
        data.insert("orbit_class".to_string(), json!(class.name));
        data.insert("orbit_class_code".to_string(), json!(class.code));
    }

    if let Some(orbit) = response.orbit {
        if let Some(epoch) = orbit.epoch {
            data.insert("epoch".to_string(), json!(epoch));
        }
        if let Some(moid) = orbit.moid {
            data.insert("moid".to_string(), json!(moid));
        }
        for element in orbit.elements {
            if let Some(value) = element.value {
                data.insert(element.name, json!(value));
            }
        }
    }

    let mut approaches = Vec::new();
    let mut next_pass = None;
    for approach in response.ca_data {
        if approach.body.as_deref().is_some_and(|body| body != "Earth") {
            continue;
        }
        let Ok(when) = NaiveDateTime::parse_from_str(&approach.cd, SBDB_DATE_FORMAT) else {
            tracing::warn!("Unreadable close-approach date {:?} for {}", approach.cd, designation);
            continue;
        };
        let when = when.and_utc();
        let date_iso = when.format(ISO_FORMAT).to_string();

        let mut extra = Document::new();
        extra.insert("date".to_string(), json!(approach.cd));
        if let Some(dist) = approach.dist {
            extra.insert("dist_au".to_string(), json!(dist));
        }
        if let Some(v_rel) = approach.v_rel {
            extra.insert("v_rel".to_string(), json!(v_rel));
        }
        let pass = NextPass {
            date_iso: Some(date_iso),
            extra,
        };

        if next_pass.is_none() && when >= now {
            next_pass = Some(pass.clone());
        }
        approaches.push(pass);
    }
    data.insert("Close Approaches".to_string(), serde_json::to_value(&approaches)?);

    let record = EphemerisRecord {
        tag_name: designation.to_string(),
        next_pass,
        data,
    };
    Ok(record.to_document())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_response() -> SbdbResponse {
        serde_json::from_value(json!({
            "object": {
                "fullname": "99942 Apophis (2004 MN4)",
                "des": "99942",
                "kind": "an",
                "neo": true,
                "pha": true,
                "orbit_class": {"name": "Aten", "code": "ATE"}
            },
            "orbit": {
                "epoch": "2461000.5",
                "moid": "0.000186",
                "elements": [
                    {"name": "e", "value": "0.1911", "label": "e"},
                    {"name": "a", "value": "0.9224", "label": "a"},
                    {"name": "i", "value": "3.336", "label": "i"},
                    {"name": "tp", "value": "", "label": "tp"}
                ]
            },
            "ca_data": [
                {"cd": "2013-Jan-09 11:46", "dist": "0.0967", "v_rel": "5.06", "body": "Earth"},
                {"cd": "2029-Apr-13 21:46", "dist": "0.000254", "v_rel": "7.42", "body": "Earth"},
                {"cd": "2029-Apr-14 13:40", "dist": "0.00065", "body": "Moon"},
                {"cd": "2036-Mar-27 06:09", "dist": "0.3", "body": "Earth"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_to_ephemeris_picks_first_future_pass() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let doc = to_ephemeris("99942", sample_response(), now).unwrap();

        assert_eq!(doc["tag_name"], json!("99942"));
        assert_eq!(doc["Next Pass"]["date_iso"], json!("2029-04-13T21:46:00"));
        assert_eq!(doc["Next Pass"]["date"], json!("2029-Apr-13 21:46"));
        assert_eq!(doc["Next Pass"]["dist_au"], json!(0.000254));
        assert_eq!(doc["Close Approaches"].as_array().unwrap().len(), 3);
        assert_eq!(doc["e"], json!(0.1911));
        assert_eq!(doc["moid"], json!(0.000186));
        assert_eq!(doc["orbit_class"], json!("Aten"));
        assert!(!doc.contains_key("tp"));
    }

    #[test]
    fn test_to_ephemeris_without_future_pass() {
        let now = Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap();
        let doc = to_ephemeris("99942", sample_response(), now).unwrap();
        assert!(!doc.contains_key("Next Pass"));
    }

    #[test]
    fn test_to_ephemeris_reports_missing_object() {
        let response: SbdbResponse =
            serde_json::from_value(json!({"message": "specified object was not found"})).unwrap();
        let err = to_ephemeris("nope", response, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_request_url_encodes_designation() {
        let client = SbdbClient::new(&EphemerisConfig::default()).unwrap();
        let url = client.request_url("2004 MN4");
        assert!(url.starts_with(&EphemerisConfig::default().base_url));
        assert!(url.contains("sstr=2004%20MN4"));
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_compute_live() {
        let client = SbdbClient::new(&EphemerisConfig::default()).unwrap();
        let doc = client.compute("433").await.unwrap();
        assert_eq!(doc["des"], json!("433"));
    }
}
