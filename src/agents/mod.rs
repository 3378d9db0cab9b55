//! Bridge between callers and the hosted agent runtime
//!
//! ## Architecture
//!
//! - `domain/` - Events, session configuration, result and stream types
//! - `runtime/` - Runtime traits and the stdio CLI adapter
//! - `client_manager` - Process-wide runtime client slot
//! - `runner` - Session resolution and buffered/streaming runs
//! - `reducer` - Buffered event reduction
//! - `bridge` - Streaming state machine

mod bridge;
pub mod client_manager;
pub mod domain;
pub mod error;
pub mod reducer;
pub mod runner;
pub mod runtime;

// Re-export commonly used types
pub use client_manager::ClientManager;
pub use domain::*;
pub use error::*;
pub use runner::{RunRequest, RunnerSettings, SessionRunner};
