use serde::{Deserialize, Serialize};

/// A schemaless record as held by the document store
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Store-internal identity field, never returned to callers
pub const ID_FIELD: &str = "_id";

/// Collections held by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "asteroids")]
    Asteroids,
    #[serde(rename = "mpc")]
    Mpc,
    #[serde(rename = "jpl")]
    Ephemerides,
    #[serde(rename = "kepler")]
    Kepler,
    #[serde(rename = "exo")]
    Exoplanets,
    #[serde(rename = "user_objects")]
    UserObjects,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Asteroids,
        Collection::Mpc,
        Collection::Ephemerides,
        Collection::Kepler,
        Collection::Exoplanets,
        Collection::UserObjects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Asteroids => "asteroids",
            Collection::Mpc => "mpc",
            Collection::Ephemerides => "jpl",
            Collection::Kepler => "kepler",
            Collection::Exoplanets => "exo",
            Collection::UserObjects => "user_objects",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asteroids" => Ok(Collection::Asteroids),
            "mpc" => Ok(Collection::Mpc),
            "jpl" | "ephemerides" => Ok(Collection::Ephemerides),
            "kepler" => Ok(Collection::Kepler),
            "exo" | "exoplanets" => Ok(Collection::Exoplanets),
            "user_objects" => Ok(Collection::UserObjects),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

/// Whitelisted ranking criteria, by their public names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingCriterion {
    Value,
    Profit,
    Accessibility,
    Score,
    Upcoming,
}

impl RankingCriterion {
    pub const ALL: [RankingCriterion; 5] = [
        RankingCriterion::Value,
        RankingCriterion::Profit,
        RankingCriterion::Accessibility,
        RankingCriterion::Score,
        RankingCriterion::Upcoming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingCriterion::Value => "value",
            RankingCriterion::Profit => "profit",
            RankingCriterion::Accessibility => "accessibility",
            RankingCriterion::Score => "score",
            RankingCriterion::Upcoming => "upcoming",
        }
    }
}

impl std::fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RankingCriterion {
    type Err = String;

    /// Public names are matched exactly; the whitelist is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(RankingCriterion::Value),
            "profit" => Ok(RankingCriterion::Profit),
            "accessibility" => Ok(RankingCriterion::Accessibility),
            "score" => Ok(RankingCriterion::Score),
            "upcoming" => Ok(RankingCriterion::Upcoming),
            _ => Err(format!("Unknown ranking: {}", s)),
        }
    }
}
