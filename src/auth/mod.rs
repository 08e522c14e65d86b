//! Authorization Module
//! Mission: Validate bearer tokens and produce gateway policies

pub mod clock;
pub mod diagnostics;
pub mod jwt;
pub mod models;
pub mod policy;

pub use clock::{Clock, FixedClock, SystemClock};
pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use jwt::{TimeWindowPolicy, TokenValidator};
pub use models::{
    AuthorizerRequest, AuthorizerResponse, Claims, DecodedToken, DenyReason, Effect, HeaderFault,
    WindowViolation,
};
pub use policy::generate_policy;
