//! Application layer: payloads, playback and sessions
//!
//! This layer orchestrates domain logic and owns the async step player.

pub mod error;
pub mod player;
pub mod presenter;
pub mod request;
pub mod schema;
pub mod session;
pub mod timeline;

pub use error::{ApplicationError, ApplicationResult};
pub use player::{PlaybackError, PlaybackResult, PlayerEvent, StepPlayer};
pub use presenter::{Frame, FrameComposer, FrameKind, Presenter};
pub use request::{Algorithm, ItemCatalog, SearchRequest, MAX_RECIPE_COUNT};
pub use schema::{
    parse_records, parse_response, RecipeResult, SchemaError, SchemaIssue, SearchMetrics,
    SearchResponse,
};
pub use session::{Intent, RecipeBrowser, Session, SessionEvent, SessionUpdate};
pub use timeline::{synthesize, timeline_for};
