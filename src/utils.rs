//! Various utilities
//!
//! Scene storage and progress reporting helpers.

pub mod arena;
pub mod progress;
