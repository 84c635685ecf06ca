//! UI-agnostic application state types
//!
//! These are the records that get persisted between runs and shared by the
//! TUI and the one-shot CLI commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// The signed-in user. There is no credential check, only a display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub is_authenticated: bool,
    pub name: String,
}

impl UserState {
    /// Build an authenticated user from a typed-in name.
    pub fn authenticated(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AgentError::Validation("name must not be empty".to_string()));
        }
        Ok(Self {
            is_authenticated: true,
            name: name.to_string(),
        })
    }
}

/// A chat message in the coaching conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Stored as RFC 3339 text and parsed back into a date-time on load.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}
