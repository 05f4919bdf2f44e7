//! Opaque credentials issued by the auth service.
//!
//! Tokens are never logged or displayed in full; `Debug` output is redacted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Secrets shorter than this are masked entirely.
const MIN_REVEAL_LEN: usize = 12;
const REVEAL_PREFIX: usize = 4;

/// Returns a short, log-safe prefix of a secret.
pub fn redact(secret: &str) -> String {
    if secret.chars().count() < MIN_REVEAL_LEN {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(REVEAL_PREFIX).collect();
    format!("{prefix}****")
}

/// Proof that the previous registration step completed. Not a session token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

/// Bearer credential for authenticated requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

macro_rules! opaque_token {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }

            pub fn redacted(&self) -> String {
                redact(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.redacted())
                    .finish()
            }
        }
    };
}

opaque_token!(VerificationToken);
opaque_token!(SessionToken);
