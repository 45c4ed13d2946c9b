//! Search service payloads: raw JSON in, validated types out.
//!
//! Field presence is checked here, once, so the engine only ever sees typed
//! values. Hard problems are collected into a [`SchemaError`]; soft gaps
//! (missing icon, message, highlight list, or a malformed partial tree) are
//! defaulted.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{CombinationRecord, SearchSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// JSON path of the offending value, e.g. `recipes[0].steps[1].result`
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid search payload: {}", .issues.iter().join("; "))]
pub struct SchemaError {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![SchemaIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeResult {
    pub target: String,
    pub steps: Vec<CombinationRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SearchMetrics {
    pub time_ms: f64,
    pub nodes_visited: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub recipes: Vec<RecipeResult>,
    pub metrics: SearchMetrics,
    /// Present only when the search service recorded its progress
    pub live_update_steps: Option<Vec<SearchSnapshot>>,
    /// Item searched for: the first recipe's target, else the first partial
    /// tree's
    pub target: Option<String>,
}

impl SearchResponse {
    pub fn recipe(&self, index: usize) -> Option<&RecipeResult> {
        self.recipes.get(index)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResponse {
    recipes: Option<Vec<RawRecipe>>,
    metrics: Option<RawMetrics>,
    live_update_steps: Option<Vec<RawLiveStep>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecipe {
    target_element: Option<String>,
    steps: Option<Vec<RawStep>>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    element1: Option<String>,
    element2: Option<String>,
    result: Option<String>,
    #[serde(alias = "icon")]
    icon_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetrics {
    time: Option<f64>,
    nodes_visited: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawLiveStep {
    step: Option<usize>,
    message: Option<String>,
    #[serde(alias = "partialTree")]
    partial_tree: Option<Value>,
    #[serde(alias = "highlightNodes", alias = "highlightedItems")]
    highlight_nodes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPartialTree {
    target_element: Option<String>,
    steps: Option<Vec<RawStep>>,
}

#[derive(Default)]
struct Validator {
    issues: Vec<SchemaIssue>,
}

impl Validator {
    fn issue(&mut self, path: String, message: &str) {
        self.issues.push(SchemaIssue {
            path,
            message: message.to_string(),
        });
    }

    fn required(&mut self, value: Option<String>, path: String) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            Some(_) => {
                self.issue(path, "must not be empty");
                String::new()
            }
            None => {
                self.issue(path, "missing field");
                String::new()
            }
        }
    }

    fn record(&mut self, raw: RawStep, path: &str) -> CombinationRecord {
        CombinationRecord {
            first: self.required(raw.element1, format!("{path}.element1")),
            second: self.required(raw.element2, format!("{path}.element2")),
            result: self.required(raw.result, format!("{path}.result")),
            icon: raw.icon_filename.unwrap_or_default(),
        }
    }

    fn records(&mut self, raw: Vec<RawStep>, path: &str) -> Vec<CombinationRecord> {
        raw.into_iter()
            .enumerate()
            .map(|(i, step)| self.record(step, &format!("{path}[{i}]")))
            .collect()
    }

    fn recipe(&mut self, raw: RawRecipe, path: &str) -> RecipeResult {
        let target = self.required(raw.target_element, format!("{path}.targetElement"));
        let steps = match raw.steps {
            Some(steps) => self.records(steps, &format!("{path}.steps")),
            None => {
                self.issue(format!("{path}.steps"), "missing field");
                Vec::new()
            }
        };
        RecipeResult { target, steps }
    }

    /// Records of one partial tree. Any issue drops the whole tree, so a bad
    /// snapshot renders empty and never fails the response.
    fn partial_records(steps: Vec<RawStep>, path: &str) -> Option<Vec<CombinationRecord>> {
        let mut scratch = Validator::default();
        let records = scratch.records(steps, path);
        if scratch.issues.is_empty() {
            Some(records)
        } else {
            warn!(
                path,
                issues = %scratch.issues.iter().join("; "),
                "malformed partial tree, rendering empty"
            );
            None
        }
    }

    /// Partial trees come as `{ targetElement, steps }`, a bare record array,
    /// or null. Anything else is a malformed snapshot and renders empty.
    fn partial_tree(
        &self,
        value: Option<Value>,
        path: &str,
    ) -> (Option<Vec<CombinationRecord>>, Option<String>) {
        match value {
            None => (None, None),
            Some(value @ Value::Array(_)) => match serde_json::from_value::<Vec<RawStep>>(value) {
                Ok(steps) => (Self::partial_records(steps, path), None),
                Err(e) => {
                    warn!(path, error = %e, "malformed partial tree, rendering empty");
                    (None, None)
                }
            },
            Some(value @ Value::Object(_)) => match serde_json::from_value::<RawPartialTree>(value) {
                Ok(RawPartialTree {
                    target_element,
                    steps: Some(steps),
                }) => (
                    Self::partial_records(steps, &format!("{path}.steps")),
                    target_element,
                ),
                Ok(_) => {
                    warn!(path, "partial tree without steps, rendering empty");
                    (None, None)
                }
                Err(e) => {
                    warn!(path, error = %e, "malformed partial tree, rendering empty");
                    (None, None)
                }
            },
            Some(other) => {
                warn!(path, kind = ?other, "unexpected partial tree, rendering empty");
                (None, None)
            }
        }
    }

    fn snapshot(&mut self, raw: RawLiveStep, position: usize) -> (SearchSnapshot, Option<String>) {
        let path = format!("liveUpdateSteps[{position}]");
        let (partial_tree, target) = self.partial_tree(raw.partial_tree, &format!("{path}.partial_tree"));
        let snapshot = SearchSnapshot {
            index: raw.step.unwrap_or(position + 1),
            message: raw.message.unwrap_or_default(),
            partial_tree,
            highlighted_items: raw.highlight_nodes.unwrap_or_default(),
        };
        (snapshot, target)
    }

    fn finish<T>(self, value: T) -> Result<T, SchemaError> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(SchemaError {
                issues: self.issues,
            })
        }
    }
}

/// Parse and validate a search response body.
#[instrument(level = "debug", skip(json), fields(bytes = json.len()))]
pub fn parse_response(json: &str) -> Result<SearchResponse, SchemaError> {
    let raw: RawSearchResponse =
        serde_json::from_str(json).map_err(|e| SchemaError::single("$", e.to_string()))?;
    let mut validator = Validator::default();

    let recipes: Vec<RecipeResult> = raw
        .recipes
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, recipe)| validator.recipe(recipe, &format!("recipes[{i}]")))
        .collect();

    let metrics = raw
        .metrics
        .map(|m| SearchMetrics {
            time_ms: m.time.unwrap_or_default(),
            nodes_visited: m.nodes_visited.unwrap_or_default(),
        })
        .unwrap_or_default();

    let mut tree_target = None;
    let live_update_steps = raw.live_update_steps.map(|steps| {
        steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| {
                let (snapshot, target) = validator.snapshot(step, i);
                if tree_target.is_none() {
                    tree_target = target;
                }
                snapshot
            })
            .collect::<Vec<_>>()
    });

    let target = recipes
        .first()
        .map(|r| r.target.clone())
        .or(tree_target);

    debug!(
        recipes = recipes.len(),
        live_steps = live_update_steps.as_ref().map(Vec::len),
        issues = validator.issues.len(),
        "search response parsed"
    );
    validator.finish(SearchResponse {
        recipes,
        metrics,
        live_update_steps,
        target,
    })
}

/// Parse a flat JSON array of records, the format of a recipe catalog file.
#[instrument(level = "debug", skip(json), fields(bytes = json.len()))]
pub fn parse_records(json: &str) -> Result<Vec<CombinationRecord>, SchemaError> {
    let raw: Vec<RawStep> =
        serde_json::from_str(json).map_err(|e| SchemaError::single("$", e.to_string()))?;
    let mut validator = Validator::default();
    let records = validator.records(raw, "$");
    validator.finish(records)
}
