//! Recipe derivation trees
//!
//! Rebuilds the tree of combinations that produces a target item from flat
//! `A + B => C` records, lays it out as positioned nodes and edges, and
//! replays recorded search progress one snapshot per tick.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
