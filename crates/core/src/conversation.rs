use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::Capability;

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Label used when rendering a transcript
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Bot => "Assistant",
        }
    }
}

/// One recorded message. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }
}

/// A tool invocation waiting on one parameter from the patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSlotRequest {
    pub tool: Capability,
    pub missing_field: String,
}
