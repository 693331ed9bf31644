//! In-memory, per-patient stores
//!
//! Both stores are cheap to clone handles around shared state guarded by
//! `tokio::sync::RwLock`. Nothing outlives the process.

mod conversation;
mod records;

pub use conversation::ConversationStore;
pub use records::PatientRecordStore;
