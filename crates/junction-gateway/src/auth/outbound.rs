//! Credential injection for forwarded requests.

use crate::rules::{KeyLocation, OutgoingAuth};
use base64::Engine as _;
use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION};
use hyper::HeaderMap;
use tracing::warn;

/// Decorate the outbound request parts with the route's credentials.
///
/// `api-key` sets a header or appends a query parameter to the target URL;
/// `bearer` and `basic` set the `Authorization` header. The body is never
/// touched. Credentials that do not form a valid header are logged and
/// skipped rather than failing the request.
pub fn apply_outgoing_auth(auth: &OutgoingAuth, url: &mut String, headers: &mut HeaderMap) {
    match auth {
        OutgoingAuth::None => {}
        OutgoingAuth::ApiKey {
            location,
            param_name,
            api_key,
        } => match location {
            KeyLocation::Header => set_header(headers, param_name, api_key),
            KeyLocation::Query => {
                let separator = if url.contains('?') { '&' } else { '?' };
                url.push(separator);
                url.push_str(&urlencoding::encode(param_name));
                url.push('=');
                url.push_str(&urlencoding::encode(api_key));
            }
        },
        OutgoingAuth::Bearer { token } => {
            set_authorization(headers, &format!("Bearer {token}"));
        }
        OutgoingAuth::Basic { username, password } => {
            let credentials = format!("{username}:{}", password.as_deref().unwrap_or(""));
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            set_authorization(headers, &format!("Basic {encoded}"));
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!("skipping api-key header {name:?}: not a valid header"),
    }
}

fn set_authorization(headers: &mut HeaderMap, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("skipping authorization header: credential is not a valid header value"),
    }
}
