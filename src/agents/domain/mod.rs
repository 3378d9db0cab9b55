//! Domain types for the agent runtime bridge
//!
//! Events, session configuration, and the two output shapes (buffered
//! result and streaming items).

mod event;
mod result;
mod session;
mod stream;

pub use event::*;
pub use result::*;
pub use session::*;
pub use stream::*;
