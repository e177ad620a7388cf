//! HTTP Basic authentication middleware.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tracing::debug;

use crate::state::AppState;

const REALM: &str = r#"Basic realm="Please enter your username and password""#;

/// Reject requests whose `Authorization: Basic` credentials don't match the
/// configured pair. A missing header is always rejected.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match basic_credentials(request.headers()) {
        Some((user, pass)) if state.auth.matches(&user, &pass) => next.run(request).await,
        _ => {
            debug!(path = %request.uri().path(), "rejected unauthenticated request");
            unauthorized()
        }
    }
}

/// Decode `Authorization: Basic base64(user:pass)`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, REALM)],
        Json(json!({ "error": "Unauthorized." })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn decodes_basic_credentials() {
        let encoded = STANDARD.encode("admin:pa:ss");
        let creds = basic_credentials(&headers_with(&format!("Basic {encoded}")));
        assert_eq!(creds, Some(("admin".to_string(), "pa:ss".to_string())));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let encoded = STANDARD.encode("u:p");
        assert!(basic_credentials(&headers_with(&format!("basic {encoded}"))).is_some());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(basic_credentials(&headers_with("Bearer abc")).is_none());
        assert!(basic_credentials(&headers_with("Basic !!!notbase64")).is_none());
        let no_colon = STANDARD.encode("justuser");
        assert!(basic_credentials(&headers_with(&format!("Basic {no_colon}"))).is_none());
        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }
}
