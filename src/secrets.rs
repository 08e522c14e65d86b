//! Signing Secret Retrieval
//! Mission: Fetch the token signing secret once per invocation
//!
//! The parameter store is reached through the AWS Parameters and Secrets
//! extension, which serves SSM parameters over local HTTP.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Symmetric signing key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted {} bytes>)", self.0.len())
    }
}

/// Source of the signing secret
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn fetch_secret(&self) -> Result<Secret>;
}

/// Secret known up front (local runs, tests)
pub struct StaticSecret {
    secret: Secret,
}

impl StaticSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Secret::new(secret),
        }
    }
}

#[async_trait]
impl SecretProvider for StaticSecret {
    async fn fetch_secret(&self) -> Result<Secret> {
        if self.secret.is_empty() {
            bail!("Static secret is empty");
        }
        Ok(self.secret.clone())
    }
}

#[derive(Debug, Deserialize)]
struct GetParameterResponse {
    #[serde(rename = "Parameter")]
    parameter: Option<Parameter>,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// SSM parameter read through the Parameters and Secrets extension
pub struct ParameterStoreSecret {
    client: reqwest::Client,
    endpoint: String,
    parameter_name: String,
    with_decryption: bool,
    session_token: Option<String>,
}

impl ParameterStoreSecret {
    pub fn new(
        endpoint: impl Into<String>,
        parameter_name: impl Into<String>,
        with_decryption: bool,
        session_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build parameter store HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            parameter_name: parameter_name.into(),
            with_decryption,
            session_token,
        })
    }

    /// Extension endpoint on the default local port
    pub fn local_extension_endpoint(port: u16) -> String {
        format!("http://localhost:{}", port)
    }
}

#[async_trait]
impl SecretProvider for ParameterStoreSecret {
    async fn fetch_secret(&self) -> Result<Secret> {
        let url = format!("{}/systemsmanager/parameters/get", self.endpoint);

        let mut request = self.client.get(&url).query(&[
            ("name", self.parameter_name.as_str()),
            (
                "withDecryption",
                if self.with_decryption { "true" } else { "false" },
            ),
        ]);
        if let Some(token) = &self.session_token {
            request = request.header("X-Aws-Parameters-Secrets-Token", token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Parameter store unreachable at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "Parameter store returned {} for {}",
                status,
                self.parameter_name
            );
        }

        let body: GetParameterResponse = response
            .json()
            .await
            .context("Failed to parse parameter store response")?;

        let value = body
            .parameter
            .and_then(|p| p.value)
            .filter(|v| !v.is_empty())
            .with_context(|| format!("Parameter {} has no value", self.parameter_name))?;

        debug!(parameter = %self.parameter_name, "Signing secret fetched");
        Ok(Secret::new(value))
    }
}
