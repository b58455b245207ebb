//! Personal time tracker with a focus timer and AI-backed analysis.
//! Entries are logged against a fixed category set and aggregated into a
//! per-category breakdown that can be summarized by a remote
//! text-generation service. The focus timer runs work/break cycles on a
//! once-per-second countdown.
//!

pub mod analysis;
pub mod cli;
pub mod store;
pub mod timer;
pub mod tracker;
pub mod utils;
