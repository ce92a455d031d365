//! Bearer token sources for backend requests.
//!
//! Credential storage belongs to the embedding application; the engine only asks
//! for a token right before each request.

use secrecy::SecretString;
use std::sync::Arc;

use crate::constants::network as net_constants;
use crate::types::{RecastError, Result};

pub trait CredentialsProvider: Send + Sync {
    fn bearer_token(&self) -> Result<SecretString>;
}

pub type SharedCredentials = Arc<dyn CredentialsProvider>;

/// Reads the token from an environment variable on every request
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(net_constants::DEFAULT_API_KEY_ENV)
    }
}

impl CredentialsProvider for EnvCredentials {
    fn bearer_token(&self) -> Result<SecretString> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(SecretString::from(token)),
            _ => Err(RecastError::config(format!(
                "API key not found. Set the {} environment variable",
                self.var
            ))),
        }
    }
}

/// Fixed token, for embedding applications holding their own secret store
pub struct StaticCredentials {
    token: SecretString,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl CredentialsProvider for StaticCredentials {
    fn bearer_token(&self) -> Result<SecretString> {
        Ok(self.token.clone())
    }
}
