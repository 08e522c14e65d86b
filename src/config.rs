//! Authorizer configuration, read from the environment.

use crate::auth::jwt::{TimeWindowPolicy, MAX_AGE_SECS, MAX_FUTURE_SECS, MAX_LIFETIME_SECS};
use crate::secrets::{ParameterStoreSecret, SecretProvider, StaticSecret};
use anyhow::{bail, Result};
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SECRET_PARAMETER: &str = "/authorizer/signing-secret";
pub const DEFAULT_EXTENSION_PORT: u16 = 2773;
pub const DEFAULT_PORT: u16 = 8080;

/// Where the signing secret comes from
#[derive(Clone, PartialEq, Eq)]
pub enum SecretSource {
    Static(String),
    ParameterStore {
        endpoint: String,
        name: String,
        with_decryption: bool,
        session_token: Option<String>,
        timeout: Duration,
    },
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Static(_) => write!(f, "Static(<redacted>)"),
            SecretSource::ParameterStore {
                endpoint,
                name,
                with_decryption,
                timeout,
                ..
            } => f
                .debug_struct("ParameterStore")
                .field("endpoint", endpoint)
                .field("name", name)
                .field("with_decryption", with_decryption)
                .field("timeout", timeout)
                .finish(),
        }
    }
}

impl SecretSource {
    pub fn build_provider(&self) -> Result<Arc<dyn SecretProvider>> {
        Ok(match self {
            SecretSource::Static(secret) => Arc::new(StaticSecret::new(secret.as_str())),
            SecretSource::ParameterStore {
                endpoint,
                name,
                with_decryption,
                session_token,
                timeout,
            } => Arc::new(ParameterStoreSecret::new(
                endpoint.as_str(),
                name.as_str(),
                *with_decryption,
                session_token.clone(),
                *timeout,
            )?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    pub port: u16,
    pub secret_source: SecretSource,
    pub window: TimeWindowPolicy,
}

impl AuthorizerConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => bail!("PORT must be a TCP port number, got {:?}", raw),
            },
        };

        let secret_source = match lookup("AUTHORIZER_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => SecretSource::Static(secret),
            None => {
                let extension_port = lookup("PARAMETERS_SECRETS_EXTENSION_HTTP_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_EXTENSION_PORT);

                SecretSource::ParameterStore {
                    endpoint: lookup("AUTHORIZER_SECRET_ENDPOINT").unwrap_or_else(|| {
                        ParameterStoreSecret::local_extension_endpoint(extension_port)
                    }),
                    name: lookup("AUTHORIZER_SECRET_PARAMETER")
                        .unwrap_or_else(|| DEFAULT_SECRET_PARAMETER.to_string()),
                    with_decryption: lookup("AUTHORIZER_SECRET_DECRYPT")
                        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
                        .unwrap_or(true),
                    session_token: lookup("AWS_SESSION_TOKEN"),
                    timeout: Duration::from_millis(
                        lookup("AUTHORIZER_SECRET_TIMEOUT_MS")
                            .and_then(|v| v.parse().ok())
                            .filter(|&v| v > 0)
                            .unwrap_or(2_000),
                    ),
                }
            }
        };

        let window = TimeWindowPolicy {
            max_age_secs: seconds(&lookup, "AUTHORIZER_MAX_AGE_SECS", MAX_AGE_SECS)?,
            max_future_secs: seconds(&lookup, "AUTHORIZER_MAX_FUTURE_SECS", MAX_FUTURE_SECS)?,
            max_lifetime_secs: seconds(
                &lookup,
                "AUTHORIZER_MAX_LIFETIME_SECS",
                MAX_LIFETIME_SECS,
            )?,
        };

        Ok(Self {
            port,
            secret_source,
            window,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: i64) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(v),
            _ => bail!("{} must be a non-negative number of seconds, got {:?}", key, raw),
        },
    }
}
