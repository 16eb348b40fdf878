//! Personal access token handling.
//!
//! A [`Credential`] is only ever created from explicit operator input: the
//! `EPLAN_PAT` environment variable or an interactive prompt. It lives in
//! memory for the process lifetime and its `Debug` output is redacted.

use std::fmt;

use thiserror::Error;
use tracing::warn;

/// Environment variable consulted for the token.
pub const PAT_ENV_VAR: &str = "EPLAN_PAT";

/// Minimum accepted token length.
pub const MIN_TOKEN_LEN: usize = 10;

/// Maximum accepted token length.
pub const MAX_TOKEN_LEN: usize = 500;

/// Reasons a token is rejected before it is ever sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Empty or whitespace-only token.
    #[error("personal access token is required")]
    Blank,

    /// Token shorter than [`MIN_TOKEN_LEN`].
    #[error("personal access token is too short ({len} characters, minimum {MIN_TOKEN_LEN})")]
    TooShort {
        /// Length of the rejected token.
        len: usize,
    },

    /// Token longer than [`MAX_TOKEN_LEN`].
    #[error("personal access token is too long ({len} characters, maximum {MAX_TOKEN_LEN})")]
    TooLong {
        /// Length of the rejected token.
        len: usize,
    },
}

/// A bearer token for the data portal API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates and wraps a token. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is blank or outside the accepted length.
    pub fn new(token: &str) -> Result<Self, CredentialError> {
        let token = token.trim();
        let len = token.chars().count();

        if len == 0 {
            return Err(CredentialError::Blank);
        }
        if len < MIN_TOKEN_LEN {
            return Err(CredentialError::TooShort { len });
        }
        if len > MAX_TOKEN_LEN {
            return Err(CredentialError::TooLong { len });
        }

        Ok(Self(token.to_string()))
    }

    /// Reads the token from [`PAT_ENV_VAR`].
    ///
    /// Returns `None` when the variable is unset or holds an invalid token.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_env_value(std::env::var(PAT_ENV_VAR).ok())
    }

    /// Interprets a raw environment value.
    #[must_use]
    pub fn from_env_value(value: Option<String>) -> Option<Self> {
        let value = value?;
        match Self::new(&value) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(variable = PAT_ENV_VAR, error = %e, "Ignoring invalid token from environment");
                None
            }
        }
    }

    /// Value of the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer PAT:{}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_token() {
        let credential = Credential::new("  sample-pat-7K2Q9X  ").unwrap();
        assert_eq!(
            credential.authorization_header(),
            "Bearer PAT:sample-pat-7K2Q9X"
        );
    }

    #[test]
    fn rejects_blank_token() {
        assert_eq!(Credential::new("   "), Err(CredentialError::Blank));
    }

    #[test]
    fn length_bounds() {
        assert_eq!(
            Credential::new("short"),
            Err(CredentialError::TooShort { len: 5 })
        );
        assert!(Credential::new(&"a".repeat(MIN_TOKEN_LEN)).is_ok());
        assert!(Credential::new(&"a".repeat(MAX_TOKEN_LEN)).is_ok());
        assert_eq!(
            Credential::new(&"a".repeat(MAX_TOKEN_LEN + 1)),
            Err(CredentialError::TooLong {
                len: MAX_TOKEN_LEN + 1
            })
        );
    }

    #[test]
    fn debug_output_is_redacted() {
        let credential = Credential::new("super-secret-token").unwrap();
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn env_value_handling() {
        assert!(Credential::from_env_value(None).is_none());
        assert!(Credential::from_env_value(Some(String::new())).is_none());
        assert!(Credential::from_env_value(Some("tiny".to_string())).is_none());
        assert!(Credential::from_env_value(Some("a-perfectly-fine-token".to_string())).is_some());
    }
}
