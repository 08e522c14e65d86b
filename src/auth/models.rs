//! Authorization Models
//! Mission: Define the token, decision, and gateway data structures

use jsonwebtoken::Header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Policy language version expected by the gateway
pub const POLICY_VERSION: &str = "2012-10-17";

/// The only action an authorizer policy ever grants or denies
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Custom authorizer event delivered by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "authorizationToken", default)]
    pub authorization_token: Option<String>,
    #[serde(rename = "methodArn")]
    pub method_arn: String,
}

/// Policy statement effect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// Single policy statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

/// IAM-style policy document consumed by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// Authorizer response returned to the gateway on success
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

/// Verified token contents
#[derive(Debug, Clone)]
pub struct Claims {
    pub header: Header,
    pub payload: Value,
    pub issued_at: i64, // iat, unix seconds
    pub expires_at: i64, // exp, unix seconds
}

/// Outcome of signature verification
#[derive(Debug, Clone)]
pub enum DecodedToken {
    Unverified(DenyReason),
    Verified { header: Header, payload: Value },
}

impl DecodedToken {
    /// Structural check: a verified token whose payload is an object with
    /// integral `exp` and `iat` becomes `Claims`, everything else is denied.
    pub fn into_claims(self) -> Result<Claims, DenyReason> {
        let (header, payload) = match self {
            DecodedToken::Unverified(reason) => return Err(reason),
            DecodedToken::Verified { header, payload } => (header, payload),
        };

        let object = payload
            .as_object()
            .ok_or(DenyReason::StructuralInvalid("payload"))?;
        let expires_at =
            numeric_date(object.get("exp")).ok_or(DenyReason::StructuralInvalid("exp"))?;
        let issued_at =
            numeric_date(object.get("iat")).ok_or(DenyReason::StructuralInvalid("iat"))?;

        Ok(Claims {
            header,
            payload,
            issued_at,
            expires_at,
        })
    }
}

// Non-negative integral seconds only: the same shape the verifier parses
// `exp` as, so expiry is never skipped for a claim accepted here.
fn numeric_date(value: Option<&Value>) -> Option<i64> {
    value?.as_u64().and_then(|secs| i64::try_from(secs).ok())
}

/// Why an authorization header was rejected.
///
/// Only ever logged; the caller of the authorizer sees a plain denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("malformed authorization header: {0}")]
    MalformedHeader(HeaderFault),
    #[error("token verification failed: {0}")]
    SignatureInvalid(String),
    #[error("token expired")]
    Expired,
    #[error("verified token is missing `{0}`")]
    StructuralInvalid(&'static str),
    #[error(transparent)]
    PolicyViolation(#[from] WindowViolation),
}

impl DenyReason {
    /// Short stable label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            DenyReason::MalformedHeader(_) => "malformed_header",
            DenyReason::SignatureInvalid(_) => "signature_invalid",
            DenyReason::Expired => "expired",
            DenyReason::StructuralInvalid(_) => "structural_invalid",
            DenyReason::PolicyViolation(_) => "policy_violation",
        }
    }
}

impl From<HeaderFault> for DenyReason {
    fn from(fault: HeaderFault) -> Self {
        DenyReason::MalformedHeader(fault)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderFault {
    #[error("authorization header is missing")]
    Missing,
    #[error("scheme is not bearer")]
    UnsupportedScheme,
    #[error("credential is missing")]
    MissingCredential,
    #[error("credential has unexpected extra segments")]
    ExtraSegments,
}

/// Time-window rule that fired, with the measured duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowViolation {
    #[error("iat more than {limit}secs in the past ({iat_duration}s)")]
    IssuedTooLongAgo { iat_duration: i64, limit: i64 },
    #[error("iat more than {limit}secs in the future ({iat_duration}s)")]
    IssuedInFuture { iat_duration: i64, limit: i64 },
    #[error("exp more than {limit}secs in the future from iat ({exp_duration}s)")]
    LifetimeTooLong { exp_duration: i64, limit: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verified(payload: Value) -> DecodedToken {
        DecodedToken::Verified {
            header: Header::default(),
            payload,
        }
    }

    #[test]
    fn test_response_uses_gateway_field_names() {
        let response = AuthorizerResponse {
            principal_id: "Id1".to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect: Effect::Allow,
                    resource: "arn:aws:execute-api:us-east-1:123:api/prod/GET/".to_string(),
                }],
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "principalId": "Id1",
                "policyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": "execute-api:Invoke",
                        "Effect": "Allow",
                        "Resource": "arn:aws:execute-api:us-east-1:123:api/prod/GET/"
                    }]
                }
            })
        );
    }

    #[test]
    fn test_request_parses_gateway_event() {
        let request: AuthorizerRequest = serde_json::from_value(json!({
            "type": "TOKEN",
            "authorizationToken": "Bearer abc",
            "methodArn": "arn:resource"
        }))
        .unwrap();
        assert_eq!(request.kind.as_deref(), Some("TOKEN"));
        assert_eq!(request.authorization_token.as_deref(), Some("Bearer abc"));
        assert_eq!(request.method_arn, "arn:resource");

        let no_token: AuthorizerRequest =
            serde_json::from_value(json!({ "methodArn": "arn:resource" })).unwrap();
        assert!(no_token.authorization_token.is_none());
    }

    #[test]
    fn test_structural_check_accepts_complete_payload() {
        let claims = verified(json!({ "iat": 100, "exp": 200, "sub": "abc" }))
            .into_claims()
            .unwrap();
        assert_eq!(claims.issued_at, 100);
        assert_eq!(claims.expires_at, 200);
        assert_eq!(claims.payload["sub"], "abc");
    }

    #[test]
    fn test_structural_check_rejects_missing_fields() {
        assert_eq!(
            verified(json!({ "iat": 100 })).into_claims().unwrap_err(),
            DenyReason::StructuralInvalid("exp")
        );
        assert_eq!(
            verified(json!({ "exp": 100 })).into_claims().unwrap_err(),
            DenyReason::StructuralInvalid("iat")
        );
        assert_eq!(
            verified(json!({ "exp": 100, "iat": "yesterday" }))
                .into_claims()
                .unwrap_err(),
            DenyReason::StructuralInvalid("iat")
        );
        assert_eq!(
            verified(json!("just a string")).into_claims().unwrap_err(),
            DenyReason::StructuralInvalid("payload")
        );
        assert_eq!(
            verified(Value::Null).into_claims().unwrap_err(),
            DenyReason::StructuralInvalid("payload")
        );
    }

    #[test]
    fn test_unverified_keeps_its_reason() {
        let reason = DenyReason::SignatureInvalid("InvalidSignature".to_string());
        let err = DecodedToken::Unverified(reason.clone())
            .into_claims()
            .unwrap_err();
        assert_eq!(err, reason);
    }

    #[test]
    fn test_non_integral_dates_rejected() {
        assert_eq!(
            verified(json!({ "iat": 100, "exp": 200.2 }))
                .into_claims()
                .unwrap_err(),
            DenyReason::StructuralInvalid("exp")
        );
        assert_eq!(
            verified(json!({ "iat": 100, "exp": -5 }))
                .into_claims()
                .unwrap_err(),
            DenyReason::StructuralInvalid("exp")
        );
    }

    #[test]
    fn test_window_violation_messages() {
        let reason: DenyReason = WindowViolation::IssuedTooLongAgo {
            iat_duration: -301,
            limit: 300,
        }
        .into();
        assert_eq!(reason.kind(), "policy_violation");
        assert_eq!(
            reason.to_string(),
            "iat more than 300secs in the past (-301s)"
        );
    }
}
