//! Cassette replay infrastructure for deterministic batch runs.

pub mod config;
pub mod format;
pub mod replayer;
