use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two credential classes a token belongs to. The classes use
/// distinct signing secrets and distinct TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenClass::Access => write!(f, "access"),
            TokenClass::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims structure that will be encoded/decoded for authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
    /// Issuer
    pub iss: String,
    /// Token class ("access" or "refresh")
    pub cls: TokenClass,
    /// Unique token id; makes every minted token (and so every refresh
    /// fingerprint) distinct even within one clock second
    pub jti: String,
}
