//! Tests for loading search responses and catalogs from disk

use std::path::PathBuf;

use rstest::{fixture, rstest};

use recipe_tree::application::{timeline_for, ApplicationError, SearchMetrics};
use recipe_tree::config::Settings;
use recipe_tree::infrastructure::{InfraError, ServiceContainer};
use recipe_tree::util::testing;

fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

#[fixture]
fn container() -> ServiceContainer {
    testing::init_test_setup();
    ServiceContainer::new(Settings::default())
}

#[rstest]
fn given_brick_response_when_loading_then_recipes_steps_and_metrics(container: ServiceContainer) {
    // Act
    let response = container
        .load_response(&resource("responses/brick.json"))
        .expect("valid response");

    // Assert
    assert_eq!(response.recipes.len(), 2);
    assert_eq!(response.recipes[1].steps.len(), 5);
    assert_eq!(response.target.as_deref(), Some("Brick"));
    assert_eq!(
        response.metrics,
        SearchMetrics {
            time_ms: 120.5,
            nodes_visited: 45
        }
    );

    let steps = response.live_update_steps.as_ref().expect("live steps");
    assert_eq!(steps.len(), 5);
    assert!(steps[0].partial_tree.is_none());
    assert_eq!(steps[1].partial_tree, Some(Vec::new()));
    assert_eq!(steps[2].highlighted_items, vec!["Mud", "Water", "Earth"]);
    assert_eq!(steps[4].index, 5);
}

#[rstest]
fn given_response_without_live_steps_when_building_timeline_then_synthesized(
    container: ServiceContainer,
) {
    let response = container
        .load_response(&resource("responses/steam.json"))
        .expect("valid response");

    let timeline = timeline_for(&response, &container.settings.primitive_set());

    let messages: Vec<_> = timeline.iter().map(|s| s.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Starting search for Steam...",
            "Exploring basic element combinations...",
            "Found combination: Water + Fire = Steam",
        ]
    );
    assert_eq!(response.recipes[0].steps[0].icon, "");
}

#[rstest]
fn given_invalid_response_when_loading_then_every_issue_reported(container: ServiceContainer) {
    let err = container
        .load_response(&resource("responses/invalid.json"))
        .unwrap_err();

    let schema = match &err {
        InfraError::Application(ApplicationError::Schema(schema)) => schema,
        other => panic!("expected schema error, got {other:?}"),
    };
    let paths: Vec<_> = schema.issues.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["recipes[0].targetElement", "recipes[0].steps[0].element2"]
    );
}

#[rstest]
fn given_missing_file_when_loading_then_io_error(container: ServiceContainer) {
    let err = container
        .load_response(&resource("responses/nope.json"))
        .unwrap_err();

    assert!(matches!(err, InfraError::Io { .. }), "{err:?}");
    assert!(err.to_string().contains("nope.json"));
}

#[rstest]
fn given_catalog_file_when_loading_then_lookup_ignores_case(container: ServiceContainer) {
    let catalog = container
        .load_catalog(&resource("catalog.json"))
        .expect("valid catalog");

    assert!(catalog.contains("lava"));
    assert_eq!(catalog.canonical("BRICK"), Some("Brick"));
    assert!(!catalog.contains("Dragon"));
}
