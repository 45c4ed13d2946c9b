//! Frames: everything a presentation adapter needs to draw one moment.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::schema::RecipeResult;
use crate::domain::{
    Anomaly, CombinationRecord, DerivationTree, LayoutEngine, LayoutGraph, SearchSnapshot,
    TreeBuilder,
};

/// What a frame shows: one recipe of a response, or one playback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameKind {
    Recipe,
    Step,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub kind: FrameKind,
    pub graph: LayoutGraph,
    /// Tree the graph was laid out from; `None` for an empty frame
    #[serde(skip)]
    pub tree: Option<DerivationTree>,
    pub message: String,
    /// 1-based position of this frame in its sequence
    pub step_index: usize,
    pub total_steps: usize,
    pub anomalies: Vec<Anomaly>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

/// Presentation adapter seam.
pub trait Presenter {
    type View;

    fn render(&self, frame: &Frame) -> Self::View;
}

/// Turns recipes and snapshots into laid-out frames.
#[derive(Debug, Clone)]
pub struct FrameComposer {
    builder: TreeBuilder,
    engine: LayoutEngine,
}

impl FrameComposer {
    pub fn new(builder: TreeBuilder, engine: LayoutEngine) -> Self {
        Self { builder, engine }
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Frame for recipe `index` (0-based) of `total`.
    #[instrument(level = "debug", skip(self, recipe, highlighted), fields(target = %recipe.target))]
    pub fn recipe_frame<S: AsRef<str>>(
        &self,
        recipe: &RecipeResult,
        index: usize,
        total: usize,
        highlighted: &[S],
    ) -> Frame {
        let outcome = self.builder.build(&recipe.steps, &recipe.target);
        let graph = self.engine.layout(&outcome.tree, highlighted);
        Frame {
            kind: FrameKind::Recipe,
            graph,
            tree: Some(outcome.tree),
            message: format!("Recipe {} of {}", index + 1, total),
            step_index: index + 1,
            total_steps: total,
            anomalies: outcome.anomalies,
        }
    }

    /// Frame for one playback snapshot.
    ///
    /// A snapshot without a partial tree yields an empty graph. A partial
    /// tree that cannot derive `target` yet is rooted at its latest result.
    #[instrument(level = "debug", skip(self, snapshot), fields(index = snapshot.index))]
    pub fn snapshot_frame(&self, snapshot: &SearchSnapshot, target: &str, total: usize) -> Frame {
        let (graph, tree, anomalies) = match &snapshot.partial_tree {
            Some(records) if !records.is_empty() => {
                let root = partial_root(records, target);
                let outcome = self.builder.build(records, root);
                let graph = self.engine.layout(&outcome.tree, snapshot.highlighted_items.as_slice());
                (graph, Some(outcome.tree), outcome.anomalies)
            }
            Some(_) => (LayoutGraph::default(), None, Vec::new()),
            None => {
                debug!("snapshot has no partial tree");
                (LayoutGraph::default(), None, Vec::new())
            }
        };
        Frame {
            kind: FrameKind::Step,
            graph,
            tree,
            message: snapshot.message.clone(),
            step_index: snapshot.index,
            total_steps: total,
            anomalies,
        }
    }
}

fn partial_root<'r>(records: &'r [CombinationRecord], target: &'r str) -> &'r str {
    if records.iter().any(|r| r.result == target) {
        return target;
    }
    records.last().map(|r| r.result.as_str()).unwrap_or(target)
}
