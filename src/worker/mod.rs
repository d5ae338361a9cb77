//! Worker Module
//!
//! The explicit worker context and its lifecycle.

mod lifecycle;
mod messages;
mod state;

pub use lifecycle::{InstallReport, Worker};
pub use state::WorkerState;
