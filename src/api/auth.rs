//! HTTP Basic auth guarding the HTML alert pages

use crate::api::server::AppState;
use crate::config::DashboardAuth;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

const COMPARE_KEY: &[u8] = b"betdesk-basic-auth";

/// Compare two secrets in constant time by verifying one's MAC against the other's
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    mac.update(expected.as_bytes());
    let expected_tag = mac.finalize().into_bytes();

    let Ok(mut check) = HmacSha256::new_from_slice(COMPARE_KEY) else {
        return false;
    };
    check.update(provided.as_bytes());
    check.verify_slice(&expected_tag).is_ok()
}

/// Username and password from an `Authorization: Basic ...` header
pub fn parse_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub fn check_credentials(headers: &HeaderMap, auth: &DashboardAuth) -> bool {
    match parse_basic(headers) {
        Some((user, pass)) => {
            let user_ok = constant_time_eq(&user, &auth.username);
            let pass_ok = constant_time_eq(&pass, &auth.password);
            user_ok & pass_ok
        }
        None => false,
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic")],
        Body::from("Unauthorized"),
    )
        .into_response()
}

/// Middleware rejecting requests without the dashboard credentials
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if check_credentials(request.headers(), &state.config.dashboard_auth) {
        next.run(request).await
    } else {
        warn!("Rejected dashboard login for {}", request.uri().path());
        unauthorized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user: &str, pass: &str) -> HeaderMap {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
        let mut h = HeaderMap::new();
        h.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
        );
        h
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("admin", "admin"));
        assert!(!constant_time_eq("admin", "admin2"));
        assert!(!constant_time_eq("", "admin"));
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(
            parse_basic(&headers("ana", "p:ss")),
            Some(("ana".to_string(), "p:ss".to_string()))
        );
        assert_eq!(parse_basic(&HeaderMap::new()), None);
    }

    #[test]
    fn test_check_credentials() {
        let auth = DashboardAuth::default();
        assert!(check_credentials(&headers("admin", "admin"), &auth));
        assert!(!check_credentials(&headers("admin", "nope"), &auth));
        assert!(!check_credentials(&headers("root", "admin"), &auth));
    }
}
