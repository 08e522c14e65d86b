//! JWT Token Validator
//! Mission: Decide whether a bearer token is authorized, and say why not

use crate::auth::{
    clock::Clock,
    diagnostics::Diagnostics,
    models::{Claims, DecodedToken, DenyReason, HeaderFault, WindowViolation},
};
use crate::secrets::Secret;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, DecodingKey, Validation};
use serde_json::Value;
use std::sync::Arc;

/// Default tolerance for tokens issued in the past
pub const MAX_AGE_SECS: i64 = 300;
/// Default clock-skew tolerance for tokens issued in the future
pub const MAX_FUTURE_SECS: i64 = 60;
/// Default upper bound on `exp - iat`
pub const MAX_LIFETIME_SECS: i64 = 300;

/// Time-window limits, all inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowPolicy {
    pub max_age_secs: i64,
    pub max_future_secs: i64,
    pub max_lifetime_secs: i64,
}

impl Default for TimeWindowPolicy {
    fn default() -> Self {
        Self {
            max_age_secs: MAX_AGE_SECS,
            max_future_secs: MAX_FUTURE_SECS,
            max_lifetime_secs: MAX_LIFETIME_SECS,
        }
    }
}

impl TimeWindowPolicy {
    /// Apply the window rules to measured durations.
    ///
    /// `iat_duration` is `iat - now` (negative when issued in the past),
    /// `exp_duration` is `exp - iat`.
    pub fn check(&self, iat_duration: i64, exp_duration: i64) -> Result<(), WindowViolation> {
        if iat_duration < self.max_age_secs.saturating_neg() {
            return Err(WindowViolation::IssuedTooLongAgo {
                iat_duration,
                limit: self.max_age_secs,
            });
        }
        if iat_duration > self.max_future_secs {
            return Err(WindowViolation::IssuedInFuture {
                iat_duration,
                limit: self.max_future_secs,
            });
        }
        if exp_duration > self.max_lifetime_secs {
            return Err(WindowViolation::LifetimeTooLong {
                exp_duration,
                limit: self.max_lifetime_secs,
            });
        }
        Ok(())
    }
}

/// Stateless bearer token validator.
///
/// Holds no secret: every call gets the secret it verifies against.
pub struct TokenValidator {
    policy: TimeWindowPolicy,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TokenValidator {
    pub fn new(clock: Arc<dyn Clock>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            policy: TimeWindowPolicy::default(),
            clock,
            diagnostics,
        }
    }

    pub fn with_policy(mut self, policy: TimeWindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &TimeWindowPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Validate a raw `Authorization` header value against `secret`.
    ///
    /// Never panics on input. Every rejection is reported to the injected
    /// diagnostics sink before being returned.
    pub fn validate(&self, authorization_header: &str, secret: &Secret) -> Result<Claims, DenyReason> {
        let result = self.run_pipeline(authorization_header, secret);
        if let Err(reason) = &result {
            self.diagnostics.denied(reason);
        }
        result
    }

    fn run_pipeline(&self, authorization_header: &str, secret: &Secret) -> Result<Claims, DenyReason> {
        let credential = bearer_credential(authorization_header)?;
        let claims = verify_signature(credential, secret).into_claims()?;
        self.check_time_window(&claims)?;
        Ok(claims)
    }

    fn check_time_window(&self, claims: &Claims) -> Result<(), WindowViolation> {
        // Whole seconds truncated toward zero, measured from a millisecond clock
        let now_millis = i128::from(self.clock.now().timestamp_millis());
        let iat_duration = saturate((i128::from(claims.issued_at) * 1000 - now_millis) / 1000);
        let exp_duration = claims.expires_at.saturating_sub(claims.issued_at);

        self.diagnostics.time_window(iat_duration, exp_duration);
        self.policy.check(iat_duration, exp_duration)
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Extract the credential from `"<scheme> <credential>"`, scheme must be
/// bearer (any case).
pub fn bearer_credential(header: &str) -> Result<&str, HeaderFault> {
    if header.trim().is_empty() {
        return Err(HeaderFault::Missing);
    }

    let (scheme, rest) = header
        .split_once(char::is_whitespace)
        .unwrap_or((header, ""));

    if !scheme.trim().eq_ignore_ascii_case("bearer") {
        return Err(HeaderFault::UnsupportedScheme);
    }

    let credential = rest.trim();
    if credential.is_empty() {
        return Err(HeaderFault::MissingCredential);
    }
    if credential.contains(char::is_whitespace) {
        return Err(HeaderFault::ExtraSegments);
    }

    Ok(credential)
}

/// Verify the credential with the algorithm its header declares.
///
/// Expiry is enforced here with zero leeway against the system clock, not
/// the validator's injected clock. A missing `exp` is left to the structural
/// check.
pub fn verify_signature(credential: &str, secret: &Secret) -> DecodedToken {
    let header = match decode_header(credential) {
        Ok(header) => header,
        Err(err) => return DecodedToken::Unverified(verification_failure(err)),
    };

    let mut validation = Validation::new(header.alg);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<Value>(
        credential,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => DecodedToken::Verified {
            header: data.header,
            payload: data.claims,
        },
        Err(err) => DecodedToken::Unverified(verification_failure(err)),
    }
}

fn verification_failure(err: jsonwebtoken::errors::Error) -> DenyReason {
    match err.kind() {
        ErrorKind::ExpiredSignature => DenyReason::Expired,
        _ => DenyReason::SignatureInvalid(err.to_string()),
    }
}
