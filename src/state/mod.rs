//! State module for tracking crawl progress
//!
//! `CodeState` tracks where each airport code is in its lifecycle:
//! queued in the frontier, in flight on a worker, or finished.

mod code_state;

pub use code_state::CodeState;
