//! User identity and user property payloads
//!
//! Transient call parameters; nothing here is stored as "the current user".

use serde::{Deserialize, Serialize};

use crate::Parameters;

/// Identify-user payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: None,
            email: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Set-user-properties payload
///
/// `high_priority` is a hint: a backend may flush immediately instead of
/// batching. Converting a bare [`Parameters`] map leaves it `false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProperties {
    pub properties: Parameters,
    #[serde(default)]
    pub high_priority: bool,
}

impl UserProperties {
    /// Regular-priority update
    pub fn new(properties: Parameters) -> Self {
        Self {
            properties,
            high_priority: false,
        }
    }

    /// Update flagged for immediate delivery
    pub fn high_priority(properties: Parameters) -> Self {
        Self {
            properties,
            high_priority: true,
        }
    }
}

impl From<Parameters> for UserProperties {
    fn from(properties: Parameters) -> Self {
        Self::new(properties)
    }
}
