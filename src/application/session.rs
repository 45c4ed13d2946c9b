//! Interactive session over one search response.
//!
//! Owns the recipe browser and the step player and maps user intents onto
//! them. Frames are composed on demand; the session holds no rendered state.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument, trace};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::player::{PlayerEvent, StepPlayer};
use crate::application::presenter::{Frame, FrameComposer};
use crate::application::schema::SearchResponse;
use crate::application::timeline::timeline_for;
use crate::domain::{PlaybackState, SearchSnapshot};

/// User actions accepted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    PrevRecipe,
    NextRecipe,
    PlayPause,
    Restart,
}

/// Clamped position within a response's recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecipeBrowser {
    index: usize,
    total: usize,
}

impl RecipeBrowser {
    pub fn new(total: usize) -> Self {
        Self { index: 0, total }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns whether the position moved; a no-op at the first recipe.
    pub fn prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Returns whether the position moved; a no-op at the last recipe.
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.total {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn label(&self) -> String {
        format!("Recipe {} of {}", self.index + 1, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Recipe(Frame),
    Playback(PlaybackState),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Frame(Frame),
    Completed { last_index: usize },
}

#[derive(Debug)]
pub struct Session {
    composer: FrameComposer,
    response: SearchResponse,
    target: String,
    timeline: Vec<SearchSnapshot>,
    browser: RecipeBrowser,
    delay: Duration,
    player: StepPlayer,
    events: UnboundedReceiver<PlayerEvent>,
    /// Generation of the sequence last loaded or rewound through this session.
    generation: u64,
}

impl Session {
    /// Spawn a player on the current runtime and load the response's
    /// timeline without starting it.
    #[instrument(level = "debug", skip_all, fields(recipes = response.recipes.len()))]
    pub async fn open(
        composer: FrameComposer,
        response: SearchResponse,
        delay: Duration,
    ) -> ApplicationResult<Self> {
        let (player, events) = StepPlayer::spawn(delay)?;
        let timeline = timeline_for(&response, composer.builder().primitives());
        let loaded = player.load(timeline.clone()).await?;
        info!(steps = timeline.len(), "session opened");
        Ok(Self {
            target: response.target.clone().unwrap_or_default(),
            browser: RecipeBrowser::new(response.recipes.len()),
            composer,
            response,
            timeline,
            delay,
            player,
            events,
            generation: loaded.generation,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn browser(&self) -> &RecipeBrowser {
        &self.browser
    }

    pub fn timeline(&self) -> &[SearchSnapshot] {
        &self.timeline
    }

    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Frame of the recipe the browser points at.
    pub fn recipe_frame(&self) -> ApplicationResult<Frame> {
        let index = self.browser.index();
        let recipe = self
            .response
            .recipe(index)
            .ok_or(ApplicationError::NoRecipes)?;
        Ok(self
            .composer
            .recipe_frame::<&str>(recipe, index, self.browser.total(), &[]))
    }

    /// Frame of timeline snapshot `position` (0-based).
    pub fn frame_at(&self, position: usize) -> ApplicationResult<Frame> {
        let snapshot = self
            .timeline
            .get(position)
            .ok_or(ApplicationError::StepOutOfRange {
                index: position,
                total: self.timeline.len(),
            })?;
        Ok(self.snapshot_frame(snapshot))
    }

    fn snapshot_frame(&self, snapshot: &SearchSnapshot) -> Frame {
        self.composer
            .snapshot_frame(snapshot, &self.target, self.timeline.len())
    }

    /// Start the timeline from its first snapshot.
    pub async fn play(&mut self) -> ApplicationResult<PlaybackState> {
        let state = self.player.start(self.timeline.clone(), self.delay).await?;
        Ok(self.track(state))
    }

    fn track(&mut self, state: PlaybackState) -> PlaybackState {
        self.generation = state.generation;
        state
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn on_intent(&mut self, intent: Intent) -> ApplicationResult<SessionUpdate> {
        match intent {
            Intent::PrevRecipe => {
                self.browser.prev();
                Ok(SessionUpdate::Recipe(self.recipe_frame()?))
            }
            Intent::NextRecipe => {
                self.browser.next();
                Ok(SessionUpdate::Recipe(self.recipe_frame()?))
            }
            Intent::PlayPause => {
                let state = self.player.toggle().await?;
                Ok(SessionUpdate::Playback(self.track(state)))
            }
            Intent::Restart => {
                let state = self.player.restart().await?;
                Ok(SessionUpdate::Playback(self.track(state)))
            }
        }
    }

    /// Swap in a new response: the browser rewinds and the player loads the
    /// new timeline without playing it.
    #[instrument(level = "debug", skip_all)]
    pub async fn replace_response(&mut self, response: SearchResponse) -> ApplicationResult<PlaybackState> {
        self.timeline = timeline_for(&response, self.composer.builder().primitives());
        self.target = response.target.clone().unwrap_or_default();
        self.browser = RecipeBrowser::new(response.recipes.len());
        self.response = response;
        debug!(steps = self.timeline.len(), "response replaced");
        let state = self.player.load(self.timeline.clone()).await?;
        Ok(self.track(state))
    }

    /// Wait for the player's next update. `None` once the player is gone.
    ///
    /// Events still queued from a sequence that has since been reloaded or
    /// rewound are skipped.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let event = self.events.recv().await?;
            if event.generation() != self.generation {
                trace!(
                    generation = event.generation(),
                    current = self.generation,
                    "dropping stale player event"
                );
                continue;
            }
            return Some(match event {
                PlayerEvent::Revealed { snapshot, .. } => {
                    SessionEvent::Frame(self.snapshot_frame(&snapshot))
                }
                PlayerEvent::Completed { last_index, .. } => SessionEvent::Completed { last_index },
            });
        }
    }

    pub async fn close(self) -> ApplicationResult<()> {
        Ok(self.player.dispose().await?)
    }
}
