//! Worker Lambda handler and trigger processing

pub mod classify;
pub mod handler;
pub mod replies;

// Re-export the main handler for convenience
pub use classify::classify;
pub use handler::{Dispatcher, handle_trigger, handler};
pub use replies::{BatchOutcome, process_batch};
