//! Tests for Session: recipe browsing and step playback over one response

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{self, timeout};

use recipe_tree::application::{
    ApplicationError, Intent, SearchResponse, Session, SessionEvent, SessionUpdate,
};
use recipe_tree::config::Settings;
use recipe_tree::domain::PlaybackPhase;
use recipe_tree::infrastructure::ServiceContainer;

const DELAY: Duration = Duration::from_millis(1000);

fn load(container: &ServiceContainer, name: &str) -> SearchResponse {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/responses")
        .join(name);
    container.load_response(&path).expect("valid response")
}

async fn open(name: &str) -> Session {
    let container = ServiceContainer::new(Settings::default());
    let response = load(&container, name);
    Session::open(container.composer().clone(), response, DELAY)
        .await
        .expect("session opens")
}

#[tokio::test(start_paused = true)]
async fn given_brick_response_when_opened_then_first_recipe_and_idle_player() {
    // Act
    let session = open("brick.json").await;

    // Assert
    assert_eq!(session.target(), "Brick");
    assert_eq!(session.timeline().len(), 5);
    assert_eq!(session.state().phase, PlaybackPhase::Idle);

    let frame = session.recipe_frame().unwrap();
    assert_eq!(frame.message, "Recipe 1 of 2");
    assert_eq!(frame.graph.target().map(|n| n.label.as_str()), Some("Brick"));
    assert_eq!(frame.graph.items().count(), 5);
}

#[tokio::test(start_paused = true)]
async fn given_two_recipes_when_browsing_then_clamped_at_both_ends() {
    let mut session = open("brick.json").await;

    let SessionUpdate::Recipe(frame) = session.on_intent(Intent::NextRecipe).await.unwrap() else {
        panic!("expected a recipe frame");
    };
    assert_eq!(frame.message, "Recipe 2 of 2");
    assert_eq!(frame.graph.items().count(), 11);

    session.on_intent(Intent::NextRecipe).await.unwrap();
    assert_eq!(session.browser().index(), 1);

    session.on_intent(Intent::PrevRecipe).await.unwrap();
    session.on_intent(Intent::PrevRecipe).await.unwrap();
    assert_eq!(session.browser().index(), 0);
}

#[tokio::test(start_paused = true)]
async fn given_live_steps_when_frames_requested_then_partial_trees_grow() {
    let session = open("brick.json").await;

    let empty = session.frame_at(0).unwrap();
    let exploring = session.frame_at(1).unwrap();
    let mud = session.frame_at(2).unwrap();
    let brick = session.frame_at(4).unwrap();

    assert!(empty.is_empty());
    assert_eq!(empty.message, "Starting search for Brick...");
    assert!(exploring.is_empty());
    assert_eq!(mud.graph.target().map(|n| n.label.as_str()), Some("Mud"));
    assert!(mud.graph.items().all(|n| n.is_highlighted));
    assert_eq!(brick.graph.nodes.len(), 7);
    assert_eq!((brick.step_index, brick.total_steps), (5, 5));
    assert!(matches!(
        session.frame_at(5),
        Err(ApplicationError::StepOutOfRange { index: 5, total: 5 })
    ));
}

#[tokio::test(start_paused = true)]
async fn given_play_when_events_drained_then_every_step_once_then_completed() {
    let mut session = open("brick.json").await;

    let state = session.play().await.unwrap();
    assert!(state.is_playing);

    let mut steps = Vec::new();
    let last = loop {
        match session.next_event().await.expect("player alive") {
            SessionEvent::Frame(frame) => steps.push(frame.step_index),
            SessionEvent::Completed { last_index } => break last_index,
        }
    };

    assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    assert_eq!(last, 4);
    assert!(session.state().is_complete);
    session.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn given_playing_when_play_pause_twice_then_paused_then_playing() {
    let mut session = open("brick.json").await;
    session.play().await.unwrap();

    let paused = session.on_intent(Intent::PlayPause).await.unwrap();
    let resumed = session.on_intent(Intent::PlayPause).await.unwrap();

    assert!(matches!(
        paused,
        SessionUpdate::Playback(state) if state.phase == PlaybackPhase::Paused
    ));
    assert!(matches!(resumed, SessionUpdate::Playback(state) if state.is_playing));
}

#[tokio::test(start_paused = true)]
async fn given_new_response_when_replaced_then_loaded_without_playing() {
    let container = ServiceContainer::new(Settings::default());
    let mut session = Session::open(
        container.composer().clone(),
        load(&container, "brick.json"),
        DELAY,
    )
    .await
    .unwrap();
    session.play().await.unwrap();
    session.on_intent(Intent::NextRecipe).await.unwrap();

    let state = session
        .replace_response(load(&container, "steam.json"))
        .await
        .unwrap();

    assert_eq!(state.phase, PlaybackPhase::Idle);
    assert_eq!(state.total_steps, 3);
    assert_eq!(session.target(), "Steam");
    assert_eq!(session.browser().index(), 0);
    assert_eq!(session.recipe_frame().unwrap().message, "Recipe 1 of 1");
}

#[tokio::test(start_paused = true)]
async fn given_playing_session_when_response_replaced_then_old_steps_not_delivered() {
    // Arrange: let a few Brick steps queue up unread
    let container = ServiceContainer::new(Settings::default());
    let mut session = Session::open(
        container.composer().clone(),
        load(&container, "brick.json"),
        DELAY,
    )
    .await
    .unwrap();
    session.play().await.unwrap();
    time::sleep(DELAY * 2 + DELAY / 2).await;

    // Act
    session
        .replace_response(load(&container, "steam.json"))
        .await
        .unwrap();

    // Assert: nothing from the Brick run surfaces while Steam sits idle
    assert!(timeout(DELAY * 3, session.next_event()).await.is_err());

    session.play().await.unwrap();
    match session.next_event().await.expect("player alive") {
        SessionEvent::Frame(frame) => {
            assert_eq!(frame.message, "Starting search for Steam...");
            assert_eq!((frame.step_index, frame.total_steps), (1, 3));
        }
        other => panic!("expected a Steam frame, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn given_queued_steps_when_restarted_then_next_frame_is_first_step() {
    let mut session = open("brick.json").await;
    session.play().await.unwrap();
    time::sleep(DELAY * 3 + DELAY / 2).await;

    session.on_intent(Intent::Restart).await.unwrap();

    let SessionEvent::Frame(frame) = session.next_event().await.expect("player alive") else {
        panic!("expected a frame");
    };
    assert_eq!(frame.step_index, 1);
    assert_eq!(frame.message, "Starting search for Brick...");
}
