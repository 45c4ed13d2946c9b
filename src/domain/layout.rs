//! Deterministic 2D layout of derivation trees.
//!
//! Every leaf occupies `leaf_width` units and an inner node spans the sum of
//! its children, so siblings get disjoint horizontal slots proportional to
//! their size. A binary node is joined to its two ingredients through a
//! synthetic combine junction half a level below it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::builder::DerivationTree;
use crate::domain::item::PrimitiveSet;

pub const DEFAULT_UNIT_WIDTH: f64 = 120.0;
pub const DEFAULT_VERTICAL_GAP: f64 = 200.0;
pub const DEFAULT_LEAF_WIDTH: f64 = 1.5;

/// Label of combine junction nodes.
pub const JUNCTION_LABEL: &str = "+";

/// Spacing constants: `unit_width` (U), `vertical_gap` (V) and the width of a
/// leaf in units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub unit_width: f64,
    pub vertical_gap: f64,
    pub leaf_width: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            unit_width: DEFAULT_UNIT_WIDTH,
            vertical_gap: DEFAULT_VERTICAL_GAP,
            leaf_width: DEFAULT_LEAF_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    Item,
    CombineJunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    /// None for junctions
    pub icon: Option<String>,
    pub x: f64,
    pub y: f64,
    pub role: NodeRole,
    pub is_primitive: bool,
    pub is_target: bool,
    pub is_highlighted: bool,
}

impl LayoutNode {
    pub fn is_junction(&self) -> bool {
        self.role == NodeRole::CombineJunction
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub highlighted: bool,
}

/// Axis-aligned extent of all node anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Positioned nodes and edges, in traversal order.
///
/// Both lists are append-only arenas: a node's position in `nodes` equals the
/// counter value its id was minted from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// First item node carrying `label`.
    pub fn find_item(&self, label: &str) -> Option<&LayoutNode> {
        self.nodes
            .iter()
            .find(|n| n.role == NodeRole::Item && n.label == label)
    }

    pub fn items(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter().filter(|n| n.role == NodeRole::Item)
    }

    pub fn junctions(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter().filter(|n| n.is_junction())
    }

    pub fn target(&self) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.is_target)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let init = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        Some(self.nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.x),
            max_x: b.max_x.max(n.x),
            min_y: b.min_y.min(n.y),
            max_y: b.max_y.max(n.y),
        }))
    }
}

fn node_id(counter: usize) -> String {
    format!("node_{counter}")
}

fn edge_id(source: &str, target: &str) -> String {
    format!("edge_{source}_{target}")
}

/// Places derivation trees on a plane.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    params: LayoutParams,
    primitives: PrimitiveSet,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams, primitives: PrimitiveSet) -> Self {
        Self { params, primitives }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Width of `node` in units: `leaf_width` for leaves, the sum of the
    /// children otherwise.
    pub fn subtree_width(&self, node: &DerivationTree) -> f64 {
        if node.children.is_empty() {
            self.params.leaf_width
        } else {
            node.children.iter().map(|c| self.subtree_width(c)).sum()
        }
    }

    /// Lay out `tree` with the root at depth 0 and its slot starting at x = 0.
    ///
    /// Identical inputs give identical coordinates and ids. Nodes that do not
    /// have exactly two children get no junction and no edges; their children
    /// are not placed.
    #[instrument(level = "debug", skip_all, fields(root = %tree.name))]
    pub fn layout<S: AsRef<str>>(&self, tree: &DerivationTree, highlighted: &[S]) -> LayoutGraph {
        let placement = Placement {
            engine: self,
            highlighted: highlighted.iter().map(|h| h.as_ref()).collect(),
        };
        let mut graph = LayoutGraph::default();
        let (_, next_id) = placement.place_node(&mut graph, tree, 0, 0.0, 0);
        debug!(nodes = next_id, edges = graph.edges.len(), "layout computed");
        graph
    }
}

struct Placement<'a> {
    engine: &'a LayoutEngine,
    highlighted: HashSet<&'a str>,
}

impl Placement<'_> {
    fn is_highlighted(&self, name: &str) -> bool {
        self.highlighted.contains(name)
    }

    /// Places `node` and its subtree; returns the node's id and the next free
    /// counter value.
    fn place_node(
        &self,
        graph: &mut LayoutGraph,
        node: &DerivationTree,
        depth: usize,
        x_offset: f64,
        counter: usize,
    ) -> (String, usize) {
        let params = &self.engine.params;
        let width = self.engine.subtree_width(node);
        let x = x_offset + width * params.unit_width / 2.0;
        let y = depth as f64 * params.vertical_gap;
        let id = node_id(counter);
        let node_highlighted = self.is_highlighted(&node.name);

        graph.nodes.push(LayoutNode {
            id: id.clone(),
            label: node.name.clone(),
            icon: Some(node.icon.clone()),
            x,
            y,
            role: NodeRole::Item,
            is_primitive: self.engine.primitives.contains(&node.name),
            is_target: depth == 0,
            is_highlighted: node_highlighted,
        });
        let mut next = counter + 1;

        let [first, second] = match node.children.as_slice() {
            [first, second] => [first, second],
            [] => return (id, next),
            other => {
                warn!(
                    item = %node.name,
                    children = other.len(),
                    "non-binary node, children not laid out"
                );
                return (id, next);
            }
        };

        let junction_id = node_id(next);
        next += 1;
        graph.nodes.push(LayoutNode {
            id: junction_id.clone(),
            label: JUNCTION_LABEL.to_string(),
            icon: None,
            x,
            y: y + params.vertical_gap / 2.0,
            role: NodeRole::CombineJunction,
            is_primitive: false,
            is_target: false,
            is_highlighted: false,
        });
        graph.edges.push(LayoutEdge {
            id: edge_id(&id, &junction_id),
            source_id: id.clone(),
            target_id: junction_id.clone(),
            highlighted: node_highlighted,
        });

        let mut child_offset = x_offset;
        for child in [first, second] {
            let (child_id, after) = self.place_node(graph, child, depth + 1, child_offset, next);
            next = after;
            child_offset += self.engine.subtree_width(child) * params.unit_width;
            graph.edges.push(LayoutEdge {
                id: edge_id(&child_id, &junction_id),
                source_id: child_id,
                target_id: junction_id.clone(),
                highlighted: node_highlighted && self.is_highlighted(&child.name),
            });
        }

        (id, next)
    }
}
