//! Common test infrastructure
//!
//! Builds a temporary dataset tree shaped like the production input:
//! `song_data/<A>/<B>/<C>/*.json` and `log_data/<year>/<month>/*-events.json`.

mod fixtures;

pub use fixtures::*;
