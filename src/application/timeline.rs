//! Snapshot timelines synthesized from a finished recipe.
//!
//! Used when the search service returned recipes but no live progress: the
//! recipe's records are replayed one combination at a time.

use tracing::instrument;

use crate::application::schema::{RecipeResult, SearchResponse};
use crate::domain::{PrimitiveSet, SearchSnapshot};

/// Two intro steps, then per record a "found" step, followed by a "trying"
/// step for every record but the last. Partial trees are cumulative.
#[instrument(level = "debug", skip_all, fields(target = %recipe.target, records = recipe.steps.len()))]
pub fn synthesize(recipe: &RecipeResult, primitives: &PrimitiveSet) -> Vec<SearchSnapshot> {
    let mut timeline = vec![
        SearchSnapshot::not_started(1, format!("Starting search for {}...", recipe.target)),
        SearchSnapshot::with_tree(
            2,
            "Exploring basic element combinations...",
            Vec::new(),
            primitives.names().to_vec(),
        ),
    ];

    let last = recipe.steps.len().saturating_sub(1);
    for (i, record) in recipe.steps.iter().enumerate() {
        let found_so_far = recipe.steps[..=i].to_vec();
        timeline.push(SearchSnapshot::with_tree(
            timeline.len() + 1,
            format!(
                "Found combination: {} + {} = {}",
                record.first, record.second, record.result
            ),
            found_so_far.clone(),
            vec![
                record.result.clone(),
                record.first.clone(),
                record.second.clone(),
            ],
        ));
        if i < last {
            timeline.push(SearchSnapshot::with_tree(
                timeline.len() + 1,
                format!("Trying combinations with {}...", record.result),
                found_so_far,
                vec![record.result.clone()],
            ));
        }
    }
    timeline
}

/// The response's own live steps, else a timeline synthesized from its first
/// recipe. Empty when there is neither.
pub fn timeline_for(response: &SearchResponse, primitives: &PrimitiveSet) -> Vec<SearchSnapshot> {
    match (&response.live_update_steps, response.recipes.first()) {
        (Some(steps), _) if !steps.is_empty() => steps.clone(),
        (_, Some(recipe)) => synthesize(recipe, primitives),
        _ => Vec::new(),
    }
}
