//! Public <-> storage field names.
//!
//! Stored column names are kept for backwards compatibility with existing
//! datasets; callers see the clearer public names. Names not in a table pass
//! through unchanged.

use asterank_common::{Document, RankingCriterion};

#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    /// `(public, storage)` pairs
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &'static [(&'static str, &'static str)] {
        self.pairs
    }

    pub fn to_storage<'a>(&self, public: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|&&(p, _)| p == public)
            .map_or(public, |&(_, storage)| storage)
    }

    /// Inverse lookup; the first public name listed wins when several map to
    /// the same storage column.
    pub fn to_public<'a>(&self, storage: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|&&(_, s)| s == storage)
            .map_or(storage, |&(public, _)| public)
    }

    /// Rewrite the keys of a filter object into storage names.
    pub fn translate_query(&self, query: &Document) -> Document {
        query
            .iter()
            .map(|(key, value)| (self.to_storage(key).to_string(), value.clone()))
            .collect()
    }
}

pub const ASTEROID_FIELDS: FieldMap =
    FieldMap::new(&[("value", "price"), ("accessibility", "closeness")]);

pub const EXOPLANET_FIELDS: FieldMap = FieldMap::new(&[
    ("full_name", "kepoi_name"),
    ("prov_des", "kepoi_name"),
    ("a", "koi_sma"),
    ("e", "koi_eccen"),
    ("i", "koi_incl"),
    ("w_bar", "koi_longp"),
    ("P", "koi_period"),
    // extras
    ("p_radius", "koi_prad"),
    ("p_temp", "koi_teq"),
    ("s_radius", "koi_srad"),
    ("s_temp", "koi_steff"),
    ("s_age", "koi_sage"),
]);

/// Storage column a ranking sorts on, through [`ASTEROID_FIELDS`]; `None`
/// for rankings that are not a plain sort.
pub fn ranking_field(criterion: RankingCriterion) -> Option<&'static str> {
    match criterion {
        RankingCriterion::Upcoming => None,
        RankingCriterion::Value
        | RankingCriterion::Profit
        | RankingCriterion::Accessibility
        | RankingCriterion::Score => Some(ASTEROID_FIELDS.to_storage(criterion.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_sort_ranking_has_a_storage_field() {
        assert_eq!(ranking_field(RankingCriterion::Value), Some("price"));
        assert_eq!(ranking_field(RankingCriterion::Profit), Some("profit"));
        assert_eq!(ranking_field(RankingCriterion::Accessibility), Some("closeness"));
        assert_eq!(ranking_field(RankingCriterion::Score), Some("score"));
        assert_eq!(ranking_field(RankingCriterion::Upcoming), None);
    }

    #[test]
    fn test_aliases_are_bidirectional() {
        assert_eq!(ASTEROID_FIELDS.to_storage("value"), "price");
        assert_eq!(ASTEROID_FIELDS.to_public("price"), "value");
        assert_eq!(ASTEROID_FIELDS.to_storage("accessibility"), "closeness");
        assert_eq!(ASTEROID_FIELDS.to_public("closeness"), "accessibility");
    }

    #[test]
    fn test_unmapped_names_pass_through() {
        assert_eq!(ASTEROID_FIELDS.to_storage("profit"), "profit");
        assert_eq!(ASTEROID_FIELDS.to_public("spec"), "spec");
        assert_eq!(EXOPLANET_FIELDS.to_storage("epoch"), "epoch");
    }

    #[test]
    fn test_shared_storage_column_maps_back_to_first_name() {
        assert_eq!(EXOPLANET_FIELDS.to_storage("prov_des"), "kepoi_name");
        assert_eq!(EXOPLANET_FIELDS.to_public("kepoi_name"), "full_name");
    }

    #[test]
    fn test_public_names_are_unique() {
        for table in [ASTEROID_FIELDS, EXOPLANET_FIELDS] {
            let mut publics: Vec<_> = table.pairs().iter().map(|(p, _)| *p).collect();
            publics.sort_unstable();
            publics.dedup();
            assert_eq!(publics.len(), table.pairs().len());
        }
    }

    #[test]
    fn test_translate_query() {
        let query = json!({"a": {"$gt": 1.0}, "e": 0.1, "koi_steff": 5700})
            .as_object()
            .cloned()
            .unwrap();

        let translated = EXOPLANET_FIELDS.translate_query(&query);
        assert_eq!(translated.get("koi_sma"), Some(&json!({"$gt": 1.0})));
        assert_eq!(translated.get("koi_eccen"), Some(&json!(0.1)));
        assert_eq!(translated.get("koi_steff"), Some(&json!(5700)));
        assert!(!translated.contains_key("a"));
    }
}
