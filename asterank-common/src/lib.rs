pub mod records;
pub mod types;

pub use records::{
    CelestialObject, DerivedOrbitalElement, EphemerisRecord, ExoplanetCandidate, NextPass,
    UserObject,
};
pub use types::{Collection, Document, RankingCriterion, ID_FIELD};
