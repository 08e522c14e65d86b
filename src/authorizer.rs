//! Gateway Authorizer
//! Mission: One invocation = fetch secret, validate token, emit policy
//!
//! Denials and operational failures stay distinct: a bad token is
//! `Denied`, an unreachable secret store is `SecretUnavailable`.

use crate::auth::{
    generate_policy, AuthorizerRequest, AuthorizerResponse, DenyReason, Effect, TokenValidator,
};
use crate::secrets::SecretProvider;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AuthorizerError {
    #[error("Unauthorized")]
    Denied(DenyReason),
    #[error("signing secret unavailable: {0:#}")]
    SecretUnavailable(anyhow::Error),
}

impl AuthorizerError {
    pub fn is_denied(&self) -> bool {
        matches!(self, AuthorizerError::Denied(_))
    }
}

pub struct Authorizer {
    secrets: Arc<dyn SecretProvider>,
    validator: TokenValidator,
}

impl Authorizer {
    pub fn new(secrets: Arc<dyn SecretProvider>, validator: TokenValidator) -> Self {
        Self { secrets, validator }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Decide one gateway request.
    ///
    /// The secret is fetched fresh for every call and handed to the
    /// validator explicitly.
    pub async fn authorize(
        &self,
        request: &AuthorizerRequest,
    ) -> Result<AuthorizerResponse, AuthorizerError> {
        let secret = self.secrets.fetch_secret().await.map_err(|err| {
            error!(error = %format!("{:#}", err), "🔐 Signing secret unavailable");
            AuthorizerError::SecretUnavailable(err)
        })?;

        let header = request.authorization_token.as_deref().unwrap_or_default();
        let claims = self
            .validator
            .validate(header, &secret)
            .map_err(AuthorizerError::Denied)?;

        let response = generate_policy(
            Effect::Allow,
            &request.method_arn,
            self.validator.clock().now(),
        );

        info!(
            principal_id = %response.principal_id,
            resource = %request.method_arn,
            issued_at = claims.issued_at,
            expires_at = claims.expires_at,
            "✅ Request authorized"
        );

        Ok(response)
    }
}
