//! Gateway Policy Generation
//! Mission: Turn a decision into the policy document the gateway enforces

use crate::auth::models::{
    AuthorizerResponse, Effect, PolicyDocument, Statement, INVOKE_ACTION, POLICY_VERSION,
};
use chrono::{DateTime, Utc};

/// Principal id for one decision, derived from the millisecond clock
pub fn principal_id(now: DateTime<Utc>) -> String {
    format!("Id{}", now.timestamp_millis())
}

/// Build the single-statement policy for `resource`, copied verbatim.
pub fn generate_policy(effect: Effect, resource: &str, now: DateTime<Utc>) -> AuthorizerResponse {
    AuthorizerResponse {
        principal_id: principal_id(now),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: resource.to_string(),
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ARN: &str = "arn:aws:execute-api:eu-west-1:123456789012:abc123/prod/GET/orders/*";

    #[test]
    fn test_allow_policy_shape() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let response = generate_policy(Effect::Allow, ARN, now);

        assert_eq!(response.principal_id, "Id1700000000123");
        assert_eq!(response.policy_document.version, "2012-10-17");
        assert_eq!(response.policy_document.statement.len(), 1);

        let statement = &response.policy_document.statement[0];
        assert_eq!(statement.action, "execute-api:Invoke");
        assert_eq!(statement.effect.as_str(), "Allow");
        assert_eq!(statement.resource, ARN);
    }

    #[test]
    fn test_deny_policy_effect() {
        let response = generate_policy(Effect::Deny, ARN, Utc::now());
        assert_eq!(response.policy_document.statement[0].effect, Effect::Deny);
    }

    #[test]
    fn test_principal_id_changes_with_time() {
        let now = Utc::now();
        assert_ne!(
            principal_id(now),
            principal_id(now + Duration::milliseconds(1))
        );
    }
}
