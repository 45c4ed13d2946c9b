//! Domain layer: items, derivation trees, layout and the playback machine
//!
//! This layer is independent of external concerns (no I/O, no timers, no config loading).

pub mod builder;
pub mod error;
pub mod item;
pub mod layout;
pub mod playback;
pub mod snapshot;

pub use builder::{Anomaly, BuildOutcome, DerivationTree, TreeBuilder};
pub use error::{DomainError, DomainResult};
pub use item::{
    default_icon_for, CombinationRecord, PrimitiveSet, DEFAULT_ICON_EXTENSION,
    DEFAULT_PRIMITIVES,
};
pub use layout::{
    Bounds, LayoutEdge, LayoutEngine, LayoutGraph, LayoutNode, LayoutParams, NodeRole,
};
pub use playback::{
    PlaybackMachine, PlaybackPhase, PlaybackState, TimerDirective, Transition,
};
pub use snapshot::SearchSnapshot;
