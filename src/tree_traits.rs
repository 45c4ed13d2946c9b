//! Text rendering of derivation trees via `termtree`.

use termtree::Tree;
use tracing::instrument;

use crate::domain::DerivationTree;

pub trait TreeNodeConvert {
    /// Plain rendering: one `Name (icon)` line per node.
    fn to_tree_string(&self) -> Tree<String>;

    /// Rendering with caller-chosen labels.
    fn to_tree_with<F>(&self, label: &F) -> Tree<String>
    where
        F: Fn(&DerivationTree) -> String;
}

impl TreeNodeConvert for DerivationTree {
    #[instrument(level = "debug", skip(self), fields(root = %self.name))]
    fn to_tree_string(&self) -> Tree<String> {
        self.to_tree_with(&|node: &DerivationTree| format!("{} ({})", node.name, node.icon))
    }

    fn to_tree_with<F>(&self, label: &F) -> Tree<String>
    where
        F: Fn(&DerivationTree) -> String,
    {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_with(label)).collect();
        Tree::new(label(self)).with_leaves(leaves)
    }
}
