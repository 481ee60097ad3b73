//! chessroom: rules engine, game controller and search-oracle client for a
//! browser chess application.
//!
//! - [`engine`]: board model, move rules, check detection, move execution,
//!   game-over detection, position encoding and the replay-based game controller.
//! - [`ai`]: computer opponent, a UCI oracle client with timeout and a random
//!   legal-move fallback.
//! - [`api`]: thin HTTP surface consumed by the UI.

pub mod ai;
pub mod api;
pub mod config;
pub mod engine;
