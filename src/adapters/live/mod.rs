//! Live adapters talking to real systems.

pub mod fs_store;
pub mod gemini;
pub mod tokio_pacer;
