//! Per-request caller context
//!
//! Transport adapters store a [`CallerContext`] in request extensions; handlers
//! pass it explicitly to the business layer. Three states are kept apart:
//!
//! - `Unset`: no adapter ran. Asking "who is calling?" here is a usage error.
//! - `Anonymous`: an adapter ran and the caller presented no credentials.
//! - `Authenticated`: an adapter ran and verified an identity.

use crate::error::{AuthError, Result};
use crate::identity::Identity;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CallerContext {
    #[default]
    Unset,
    Anonymous,
    Authenticated(Identity),
}

impl CallerContext {
    /// Context produced by a transport adapter after resolution
    pub fn resolved(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => CallerContext::Authenticated(identity),
            None => CallerContext::Anonymous,
        }
    }

    pub fn authenticated(subject: impl Into<String>) -> Self {
        CallerContext::Authenticated(Identity::new(subject))
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, CallerContext::Unset)
    }

    /// Identity or explicit anonymity
    ///
    /// Fails with `IdentityNotProvided` if no adapter populated the context.
    pub fn identity(&self) -> Result<Option<&Identity>> {
        match self {
            CallerContext::Unset => Err(AuthError::IdentityNotProvided),
            CallerContext::Anonymous => Ok(None),
            CallerContext::Authenticated(identity) => Ok(Some(identity)),
        }
    }

    /// Identity for operations that need one
    ///
    /// `Unset` fails with `IdentityNotProvided`, `Anonymous` with
    /// `IdentityRequired`.
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity()?.ok_or(AuthError::IdentityRequired)
    }

    /// Subject for logging; empty when no identity is present
    pub fn subject(&self) -> &str {
        match self {
            CallerContext::Authenticated(identity) => identity.subject(),
            _ => "",
        }
    }
}

impl From<Option<Identity>> for CallerContext {
    fn from(identity: Option<Identity>) -> Self {
        CallerContext::resolved(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let context = CallerContext::default();
        assert!(!context.is_set());
        assert_eq!(context.identity(), Err(AuthError::IdentityNotProvided));
        assert_eq!(context.require_identity(), Err(AuthError::IdentityNotProvided));
    }

    #[test]
    fn test_anonymous_is_distinct_from_unset() {
        let context = CallerContext::resolved(None);
        assert!(context.is_set());
        assert_eq!(context.identity(), Ok(None));
        assert_eq!(context.require_identity(), Err(AuthError::IdentityRequired));
    }

    #[test]
    fn test_authenticated() {
        let context = CallerContext::from(Some(Identity::new("A")));
        assert_eq!(context.identity(), Ok(Some(&Identity::new("A"))));
        assert_eq!(context.require_identity().unwrap().subject(), "A");
        assert_eq!(context.subject(), "A");
    }
}
