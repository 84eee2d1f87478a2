//! Adapter implementations for port traits.
//!
//! - `live/` — Gemini API, filesystem store, wall-clock pacer
//! - `replaying/` — Replay generator interactions from cassettes

pub mod live;
pub mod replaying;
