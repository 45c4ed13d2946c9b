//! Search requests and their validation before anything reaches the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{CombinationRecord, DomainError, DomainResult, PrimitiveSet};

/// Upper bound of the "multiple recipes" slider.
pub const MAX_RECIPE_COUNT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Bfs,
    Dfs,
    Bidirectional,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
            Algorithm::Bidirectional => "bidirectional",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" => Ok(Algorithm::Bfs),
            "dfs" => Ok(Algorithm::Dfs),
            "bidirectional" | "bidi" => Ok(Algorithm::Bidirectional),
            _ => Err(DomainError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Known item names, looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    by_key: BTreeMap<String, String>,
}

impl ItemCatalog {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for name in names {
            catalog.insert(name.into());
        }
        catalog
    }

    /// Every item a record mentions, ingredients and results alike.
    pub fn from_records(records: &[CombinationRecord]) -> Self {
        Self::from_names(
            records
                .iter()
                .flat_map(|r| [r.first.as_str(), r.second.as_str(), r.result.as_str()]),
        )
    }

    fn insert(&mut self, name: String) {
        self.by_key.entry(name.to_lowercase()).or_insert(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_key.contains_key(&name.to_lowercase())
    }

    /// Catalog spelling of `name`.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.by_key.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Body sent to the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub algorithm: Algorithm,
    pub target_element: String,
    pub multiple_recipes: bool,
    pub recipe_count: u32,
}

impl SearchRequest {
    /// `recipe_count` of `None` asks for a single (shortest) recipe.
    pub fn new(algorithm: Algorithm, target: impl Into<String>, recipe_count: Option<u32>) -> Self {
        Self {
            algorithm,
            target_element: target.into(),
            multiple_recipes: recipe_count.is_some(),
            recipe_count: recipe_count.unwrap_or(1),
        }
    }

    /// Reject requests the engine must never see; returns the request with
    /// the target trimmed and, given a catalog, in catalog spelling.
    #[instrument(level = "debug", skip(primitives, catalog))]
    pub fn validated(
        mut self,
        primitives: &PrimitiveSet,
        catalog: Option<&ItemCatalog>,
    ) -> DomainResult<Self> {
        let target = self.target_element.trim();
        if target.is_empty() {
            return Err(DomainError::EmptyTarget);
        }
        if primitives.contains(target) {
            return Err(DomainError::PrimitiveTarget(target.to_string()));
        }
        let target = match catalog {
            Some(catalog) => catalog
                .canonical(target)
                .ok_or_else(|| DomainError::UnknownTarget(target.to_string()))?
                .to_string(),
            None => target.to_string(),
        };
        if self.multiple_recipes && !(1..=MAX_RECIPE_COUNT).contains(&self.recipe_count) {
            return Err(DomainError::InvalidRecipeCount {
                count: self.recipe_count,
                max: MAX_RECIPE_COUNT,
            });
        }
        self.target_element = target;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_records(&[
            CombinationRecord::without_icon("Water", "Earth", "Mud"),
            CombinationRecord::without_icon("Mud", "Fire", "Brick"),
        ])
    }

    #[test]
    fn given_request_when_serialized_then_uses_service_field_names() {
        let request = SearchRequest::new(Algorithm::Bidirectional, "Brick", Some(3));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "algorithm": "bidirectional",
                "targetElement": "Brick",
                "multipleRecipes": true,
                "recipeCount": 3
            })
        );
    }

    #[rstest]
    #[case("", DomainError::EmptyTarget)]
    #[case("   ", DomainError::EmptyTarget)]
    #[case("fire", DomainError::PrimitiveTarget("fire".into()))]
    #[case("Dragon", DomainError::UnknownTarget("Dragon".into()))]
    fn given_invalid_target_when_validating_then_rejected(
        #[case] target: &str,
        #[case] expected: DomainError,
    ) {
        let err = SearchRequest::new(Algorithm::Bfs, target, None)
            .validated(&PrimitiveSet::default(), Some(&catalog()))
            .unwrap_err();
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn given_out_of_range_count_when_validating_then_rejected(#[case] count: u32) {
        let err = SearchRequest::new(Algorithm::Dfs, "Brick", Some(count))
            .validated(&PrimitiveSet::default(), None)
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidRecipeCount { count, max: 10 });
    }

    #[test]
    fn given_lowercase_target_when_validating_with_catalog_then_canonicalized() {
        let request = SearchRequest::new(Algorithm::Bfs, " brick ", None)
            .validated(&PrimitiveSet::default(), Some(&catalog()))
            .unwrap();
        assert_eq!(request.target_element, "Brick");
        assert!(!request.multiple_recipes);
        assert_eq!(request.recipe_count, 1);
    }

    #[rstest]
    #[case("bfs", Algorithm::Bfs)]
    #[case("DFS", Algorithm::Dfs)]
    #[case("bidirectional", Algorithm::Bidirectional)]
    fn given_algorithm_name_when_parsing_then_matches(#[case] text: &str, #[case] expected: Algorithm) {
        assert_eq!(text.parse::<Algorithm>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<Algorithm>().unwrap(), expected);
    }

    #[test]
    fn given_catalog_when_built_from_records_then_holds_every_item() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.contains("EARTH"));
        assert_eq!(catalog.canonical("mud"), Some("Mud"));
    }
}
