//! Tree builder for reconstructing derivation trees from combination records.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::domain::item::{default_icon_for, CombinationRecord, PrimitiveSet, DEFAULT_ICON_EXTENSION};

/// How one item is derived: a leaf, or exactly two ingredient subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationTree {
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub children: Vec<DerivationTree>,
}

impl DerivationTree {
    pub fn leaf(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            children: Vec::new(),
        }
    }

    pub fn combined(
        name: impl Into<String>,
        icon: impl Into<String>,
        first: DerivationTree,
        second: DerivationTree,
    ) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            children: vec![first, second],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of levels; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Leaf names, left to right.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a str>) {
        if self.children.is_empty() {
            leaves.push(&self.name);
        } else {
            for child in &self.children {
                child.collect_leaves(leaves);
            }
        }
    }

    /// Pre-order walk over all nodes.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator { stack: vec![self] }
    }
}

pub struct TreeIterator<'a> {
    stack: Vec<&'a DerivationTree>,
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a DerivationTree;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in current.children.iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}

/// Data problem found while expanding records. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    /// `item` depends on itself; `path` lists its ancestors from the root.
    CyclicRecipe { item: String, path: Vec<String> },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::CyclicRecipe { item, path } => {
                write!(f, "cyclic recipe: {} -> {}", path.join(" -> "), item)
            }
        }
    }
}

/// Tree plus whatever anomalies were flagged while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub tree: DerivationTree,
    pub anomalies: Vec<Anomaly>,
}

impl BuildOutcome {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct RecipeEntry<'r> {
    first: &'r str,
    second: &'r str,
    icon: &'r str,
}

/// Constructs derivation trees from flat combination records.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    primitives: PrimitiveSet,
    icon_extension: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(PrimitiveSet::default(), DEFAULT_ICON_EXTENSION)
    }
}

impl TreeBuilder {
    pub fn new(primitives: PrimitiveSet, icon_extension: impl Into<String>) -> Self {
        Self {
            primitives,
            icon_extension: icon_extension.into(),
        }
    }

    pub fn primitives(&self) -> &PrimitiveSet {
        &self.primitives
    }

    /// Icon used for leaves and for records without one.
    pub fn default_icon(&self, name: &str) -> String {
        default_icon_for(name, &self.icon_extension)
    }

    /// Build the derivation tree of `target`.
    ///
    /// Only the first record per result counts. Primitives and items no record
    /// produces become leaves. An item found again on its own ancestor path is
    /// cut to a leaf and reported as [`Anomaly::CyclicRecipe`], so recursion
    /// depth never exceeds the number of distinct results.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[CombinationRecord], target: &str) -> BuildOutcome {
        let index = self.index_records(records);
        let mut expansion = Expansion {
            builder: self,
            index: &index,
            path: Vec::new(),
            anomalies: Vec::new(),
        };
        let tree = expansion.expand(target);
        debug!(
            nodes = tree.node_count(),
            anomalies = expansion.anomalies.len(),
            "derivation tree built"
        );
        BuildOutcome {
            tree,
            anomalies: expansion.anomalies,
        }
    }

    fn index_records<'r>(&self, records: &'r [CombinationRecord]) -> HashMap<&'r str, RecipeEntry<'r>> {
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            match index.entry(record.result.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(RecipeEntry {
                        first: &record.first,
                        second: &record.second,
                        icon: &record.icon,
                    });
                }
                Entry::Occupied(_) => {
                    trace!(result = %record.result, "ignoring duplicate record");
                }
            }
        }
        index
    }
}

struct Expansion<'b, 'r> {
    builder: &'b TreeBuilder,
    index: &'b HashMap<&'r str, RecipeEntry<'r>>,
    path: Vec<String>,
    anomalies: Vec<Anomaly>,
}

impl Expansion<'_, '_> {
    fn expand(&mut self, name: &str) -> DerivationTree {
        if self.builder.primitives.contains(name) {
            return self.leaf(name);
        }
        let Some(entry) = self.index.get(name).copied() else {
            trace!(item = name, "no recipe, treating as leaf");
            return self.leaf(name);
        };
        if self.path.iter().any(|ancestor| ancestor == name) {
            warn!(item = name, path = ?self.path, "cyclic recipe cut to leaf");
            self.anomalies.push(Anomaly::CyclicRecipe {
                item: name.to_string(),
                path: self.path.clone(),
            });
            return self.leaf(name);
        }

        self.path.push(name.to_string());
        let first = self.expand(entry.first);
        let second = self.expand(entry.second);
        self.path.pop();

        let icon = if entry.icon.is_empty() {
            self.builder.default_icon(name)
        } else {
            entry.icon.to_string()
        };
        DerivationTree::combined(name, icon, first, second)
    }

    fn leaf(&self, name: &str) -> DerivationTree {
        DerivationTree::leaf(name, self.builder.default_icon(name))
    }
}
