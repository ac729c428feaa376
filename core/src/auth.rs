//! HTTP Basic credentials for the chat-log endpoints.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("authorization header must use the Basic scheme")]
    WrongScheme,
    #[error("basic credentials are not valid base64")]
    InvalidEncoding,
    #[error("basic credentials must have the form user:password")]
    MissingSeparator,
}

/// A decoded `user:password` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization` header value (`Basic <base64>`).
    pub fn from_header(value: &str) -> Result<Self, CredentialsError> {
        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or(CredentialsError::WrongScheme)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(CredentialsError::WrongScheme);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CredentialsError::InvalidEncoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialsError::InvalidEncoding)?;
        let (user, password) = decoded
            .split_once(':')
            .ok_or(CredentialsError::MissingSeparator)?;

        Ok(Self::new(user, password))
    }

    /// `Basic <base64(user:password)>`
    pub fn to_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.user, self.password))
        )
    }
}

/// Credentials the server accepts, kept as SHA-256 digests so comparison
/// does not depend on the length of the submitted values.
#[derive(Clone)]
pub struct ExpectedCredentials {
    user: [u8; 32],
    password: [u8; 32],
}

impl ExpectedCredentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: digest(user),
            password: digest(password),
        }
    }

    pub fn matches(&self, candidate: &BasicCredentials) -> bool {
        let user_ok = digest(&candidate.user) == self.user;
        let password_ok = digest(&candidate.password) == self.password;
        user_ok & password_ok
    }
}

impl std::fmt::Debug for ExpectedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExpectedCredentials(..)")
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}
