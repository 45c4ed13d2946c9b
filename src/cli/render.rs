//! Terminal presenters for frames.

use colored::Colorize;
use itertools::Itertools;

use crate::application::{Frame, FrameKind, Presenter};
use crate::domain::{DerivationTree, LayoutNode};
use crate::tree_traits::TreeNodeConvert;

/// Human-readable frame: header, tree, and optionally node positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPresenter {
    pub coordinates: bool,
}

impl TextPresenter {
    pub fn with_coordinates() -> Self {
        Self { coordinates: true }
    }

    fn header(frame: &Frame) -> String {
        if frame.kind == FrameKind::Step && frame.total_steps > 0 {
            format!(
                "[{}/{}] {}",
                frame.step_index, frame.total_steps, frame.message
            )
        } else {
            frame.message.clone()
        }
    }

    fn tree_text(frame: &Frame, tree: &DerivationTree) -> String {
        let label = |node: &DerivationTree| {
            let highlighted = frame
                .graph
                .find_item(&node.name)
                .is_some_and(|n| n.is_highlighted);
            if highlighted {
                format!("{} ({})", node.name.yellow().bold(), node.icon)
            } else {
                format!("{} ({})", node.name, node.icon)
            }
        };
        tree.to_tree_with(&label).to_string()
    }

    fn node_line(node: &LayoutNode) -> String {
        let flags = [
            (node.is_target, "target"),
            (node.is_primitive, "primitive"),
            (node.is_highlighted, "highlighted"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .join(", ");
        let position = format!("({:.0}, {:.0})", node.x, node.y);
        if flags.is_empty() {
            format!("{:<10} {:<14} {}", node.id, node.label, position)
        } else {
            format!("{:<10} {:<14} {} [{}]", node.id, node.label, position, flags)
        }
    }
}

impl Presenter for TextPresenter {
    type View = String;

    fn render(&self, frame: &Frame) -> String {
        let mut out = vec![Self::header(frame).cyan().bold().to_string()];
        match &frame.tree {
            Some(tree) => out.push(Self::tree_text(frame, tree).trim_end().to_string()),
            None => out.push("(no tree yet)".dimmed().to_string()),
        }
        if self.coordinates && !frame.is_empty() {
            out.extend(frame.graph.nodes.iter().map(Self::node_line));
        }
        out.extend(
            frame
                .anomalies
                .iter()
                .map(|a| format!("{} {}", "!".yellow(), a)),
        );
        out.join("\n")
    }
}

/// Frame as JSON, pretty or one line per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPresenter {
    pub compact: bool,
}

impl Presenter for JsonPresenter {
    type View = Result<String, serde_json::Error>;

    fn render(&self, frame: &Frame) -> Self::View {
        if self.compact {
            serde_json::to_string(frame)
        } else {
            serde_json::to_string_pretty(frame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{FrameComposer, RecipeResult};
    use crate::domain::{CombinationRecord, LayoutEngine, SearchSnapshot, TreeBuilder};

    fn frame() -> Frame {
        colored::control::set_override(false);
        let recipe = RecipeResult {
            target: "Mud".into(),
            steps: vec![CombinationRecord::new("Water", "Earth", "Mud", "mud.png")],
        };
        FrameComposer::new(TreeBuilder::default(), LayoutEngine::default())
            .recipe_frame(&recipe, 0, 1, &["Mud"])
    }

    #[test]
    fn given_recipe_frame_when_rendering_text_then_header_and_tree() {
        let text = TextPresenter::default().render(&frame());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Recipe 1 of 1");
        assert_eq!(lines[1], "Mud (mud.png)");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn given_step_message_starting_like_recipe_when_rendering_then_keeps_counter() {
        colored::control::set_override(false);
        let snapshot = SearchSnapshot::not_started(2, "Recipe found for Brick");
        let frame = FrameComposer::new(TreeBuilder::default(), LayoutEngine::default())
            .snapshot_frame(&snapshot, "Brick", 5);

        let text = TextPresenter::default().render(&frame);

        assert_eq!(text.lines().next(), Some("[2/5] Recipe found for Brick"));
    }

    #[test]
    fn given_coordinates_when_rendering_text_then_one_line_per_node() {
        let text = TextPresenter::with_coordinates().render(&frame());
        assert!(text.contains("node_0"));
        assert!(text.contains("[target, highlighted]"));
        assert!(text.contains("(90, 200)"));
    }

    #[test]
    fn given_frame_when_rendering_json_then_camel_case_keys() {
        let json = JsonPresenter { compact: true }.render(&frame()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message"], "Recipe 1 of 1");
        assert_eq!(value["stepIndex"], 1);
        assert_eq!(value["kind"], "recipe");
        assert_eq!(value["graph"]["nodes"][0]["isTarget"], true);
        assert!(value.get("tree").is_none());
    }
}
