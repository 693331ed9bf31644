//! The conversational tool-dispatch engine

mod controller;
mod dispatcher;
mod locks;

pub use controller::{DEGRADED_REPLY, DialogueController, INTERNAL_ERROR_REPLY};
pub use dispatcher::{ReportPolicy, TimePolicy, ToolDispatcher};
pub use locks::{TurnGuard, TurnLocks};
