//! Inbound authentication against an incoming route's policy.

use crate::condition::RequestProjection;
use crate::rules::{IncomingAuth, KeyLocation};

/// Check the caller's credentials against the route policy.
///
/// Failure is a plain `false`; the dispatcher decides the resulting status
/// code, since a later route may still claim the request.
pub fn authenticate(projection: &RequestProjection, auth: &IncomingAuth) -> bool {
    match auth {
        IncomingAuth::None => true,
        IncomingAuth::ApiKey {
            location,
            param_name,
            allowed_keys,
        } => {
            let candidate = match location {
                // Header keys are lower-cased in the projection.
                KeyLocation::Header => projection.headers.get(&param_name.to_lowercase()),
                KeyLocation::Query => projection.query.get(param_name),
            };
            candidate.is_some_and(|key| !key.is_empty() && allowed_keys.contains(key))
        }
        IncomingAuth::Bearer { allowed_tokens } => projection
            .headers
            .get("authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
            .is_some_and(|token| !token.is_empty() && allowed_tokens.iter().any(|t| t == token)),
    }
}
