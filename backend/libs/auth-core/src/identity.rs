use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated principal
///
/// The subject is opaque: it is compared by exact string equality and never
/// parsed. An absent identity (`Option::None`) represents an anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Check whether this identity owns a resource stamped with `owner`
    pub fn owns(&self, owner: &str) -> bool {
        self.subject == owner
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)
    }
}
