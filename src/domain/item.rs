//! Items, primitives and combination records

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// The canonical primitives. They never have a recipe.
pub const DEFAULT_PRIMITIVES: [&str; 4] = ["Water", "Fire", "Earth", "Air"];

/// Extension appended to derived icon names.
pub const DEFAULT_ICON_EXTENSION: &str = "png";

/// "first + second produces result", with the icon of the result.
///
/// An empty `icon` means the record carried none; the tree builder then falls
/// back to [`default_icon_for`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinationRecord {
    pub first: String,
    pub second: String,
    pub result: String,
    #[serde(default)]
    pub icon: String,
}

impl CombinationRecord {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        result: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            result: result.into(),
            icon: icon.into(),
        }
    }

    /// Record without an icon of its own.
    pub fn without_icon(
        first: impl Into<String>,
        second: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::new(first, second, result, String::new())
    }

    /// True when the result is one of its own ingredients.
    pub fn is_self_referential(&self) -> bool {
        self.result == self.first || self.result == self.second
    }

    /// Ingredient names, in record order.
    pub fn ingredients(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }
}

impl fmt::Display for CombinationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} => {}", self.first, self.second, self.result)
    }
}

fn record_regex() -> &'static Regex {
    static RECORD_RE: OnceLock<Regex> = OnceLock::new();
    RECORD_RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<first>[^+=]+?)\s*\+\s*(?P<second>[^+=]+?)\s*=>?\s*(?P<result>[^+=]+?)\s*$")
            .expect("record pattern is valid")
    })
}

/// Parses `"First + Second => Result"`; a single `=` is accepted as well.
impl FromStr for CombinationRecord {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = record_regex()
            .captures(s)
            .ok_or_else(|| DomainError::InvalidRecordText {
                text: s.to_string(),
                reason: "expected 'First + Second => Result'".to_string(),
            })?;
        Ok(Self::without_icon(
            &caps["first"],
            &caps["second"],
            &caps["result"],
        ))
    }
}

/// Fallback icon for leaves and for records without one: the lower-cased
/// name plus `extension`, e.g. `Mud` -> `mud.png`.
///
/// An empty extension yields the bare lower-cased name.
pub fn default_icon_for(name: &str, extension: &str) -> String {
    let stem = name.to_lowercase();
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

/// Fixed set of items that are always tree leaves.
///
/// Membership is ASCII case-insensitive; `names()` keeps the configured
/// spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSet {
    names: Vec<String>,
}

impl Default for PrimitiveSet {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMITIVES)
    }
}

impl PrimitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for name in names.into_iter().map(Into::into) {
            if !set.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                set.push(name);
            }
        }
        Self { names: set }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|p| p.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
