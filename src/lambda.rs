//! Lambda Entrypoint
//! Mission: Answer API Gateway custom-authorizer invocations directly
//!
//! A denial is returned as the bare `Unauthorized` error, which the gateway
//! turns into a 401. Any other error makes the gateway answer 500.

use crate::auth::{AuthorizerRequest, AuthorizerResponse};
use crate::authorizer::{Authorizer, AuthorizerError};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::debug;

/// Error message the gateway maps to 401
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Decide one authorizer event.
pub async fn handle_event(
    authorizer: &Authorizer,
    event: LambdaEvent<AuthorizerRequest>,
) -> Result<AuthorizerResponse, Error> {
    debug!(request_id = %event.context.request_id, "Authorizer invoked");

    match authorizer.authorize(&event.payload).await {
        Ok(response) => Ok(response),
        Err(AuthorizerError::Denied(_)) => Err(UNAUTHORIZED.into()),
        Err(err @ AuthorizerError::SecretUnavailable(_)) => Err(err.into()),
    }
}

/// Run the Lambda runtime loop until the environment shuts down.
pub async fn run(authorizer: Arc<Authorizer>) -> Result<(), Error> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<AuthorizerRequest>| {
        let authorizer = authorizer.clone();
        async move { handle_event(&authorizer, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Effect, FixedClock, RecordingDiagnostics, TokenValidator};
    use crate::secrets::{Secret, SecretProvider, StaticSecret};
    use async_trait::async_trait;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use lambda_runtime::Context;
    use serde_json::json;

    const SECRET: &str = "lambda-test-secret";
    const ARN: &str = "arn:aws:execute-api:us-east-1:123456789012:example/prod/POST/{proxy+}";

    struct UnreachableStore;

    #[async_trait]
    impl SecretProvider for UnreachableStore {
        async fn fetch_secret(&self) -> anyhow::Result<Secret> {
            anyhow::bail!("connection refused")
        }
    }

    fn authorizer(secrets: Arc<dyn SecretProvider>, now: i64) -> Authorizer {
        let clock = Arc::new(FixedClock::from_unix_secs(now).unwrap());
        let validator = TokenValidator::new(clock, Arc::new(RecordingDiagnostics::new()));
        Authorizer::new(secrets, validator)
    }

    fn event(authorization: &str) -> LambdaEvent<AuthorizerRequest> {
        let payload: AuthorizerRequest = serde_json::from_value(json!({
            "type": "TOKEN",
            "authorizationToken": authorization,
            "methodArn": ARN,
        }))
        .unwrap();
        LambdaEvent::new(payload, Context::default())
    }

    fn token(iat: i64, exp: i64) -> String {
        encode(
            &Header::default(),
            &json!({ "iat": iat, "exp": exp }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_handle_event_allows_valid_token() {
        let now = Utc::now().timestamp();
        let authorizer = authorizer(Arc::new(StaticSecret::new(SECRET)), now);

        let response = handle_event(
            &authorizer,
            event(&format!("Bearer {}", token(now, now + 120))),
        )
        .await
        .unwrap();

        let statement = &response.policy_document.statement[0];
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.resource, ARN);
        assert_eq!(response.principal_id, format!("Id{}", now * 1000));
    }

    #[tokio::test]
    async fn test_handle_event_denies_with_unauthorized() {
        let now = Utc::now().timestamp();
        let authorizer = authorizer(Arc::new(StaticSecret::new(SECRET)), now);

        let err = handle_event(
            &authorizer,
            event(&format!("Basic {}", token(now, now + 120))),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_handle_event_secret_failure_is_not_a_denial() {
        let now = Utc::now().timestamp();
        let authorizer = authorizer(Arc::new(UnreachableStore), now);

        let err = handle_event(
            &authorizer,
            event(&format!("Bearer {}", token(now, now + 120))),
        )
        .await
        .unwrap_err();

        assert_ne!(err.to_string(), UNAUTHORIZED);
        assert!(err.to_string().contains("connection refused"));
    }
}
