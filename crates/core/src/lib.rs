//! assistant-core: Domain types and pure logic for the hospital assistant
//!
//! This crate holds everything that does not need I/O: patient and record
//! types, the prompt renderer sent to the language model, and the parser
//! that turns the model's reply into a structured decision.

pub mod conversation;
pub mod decision;
pub mod error;
pub mod patient;
pub mod prompt;
pub mod record;

pub use conversation::{ConversationTurn, PendingSlotRequest, Role};
pub use decision::{Capability, ParsedDecision, ToolKind};
pub use error::{CoreError, DispatchError, ParseFailure};
pub use patient::PatientId;
pub use record::{Appointment, AppointmentStatus, EmergencyReport};
