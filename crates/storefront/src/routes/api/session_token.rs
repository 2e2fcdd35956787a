//! Customer access token cookie.
//!
//! The browser hands over a Customer Account access token once; it is kept
//! in an HTTP-only cookie and attached to new carts as buyer identity. Both
//! endpoints only act on same-origin requests.

use axum::{
    Json,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{HOST, ORIGIN, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::instrument;
use url::Url;

use super::ApiError;
use crate::currency::cookie::read_cookie;
use crate::error::add_breadcrumb;
use crate::state::AppState;

/// Cookie holding the customer access token.
pub const ACCESS_TOKEN_COOKIE: &str = "customer_access_token";

/// Lifetime when the client sends no expiry.
const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Set-token request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenRequest {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for SessionTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenRequest")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The access token sent with this request, if any.
#[must_use]
pub fn read_access_token(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, ACCESS_TOKEN_COOKIE)
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
}

/// Store the access token in an HTTP-only cookie.
#[instrument(skip(state, headers, body))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SessionTokenRequest>,
) -> Result<Response, ApiError> {
    ensure_same_origin(&headers)?;

    let token = body.access_token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("accessToken is required"));
    }

    let max_age = match body.expires_at {
        Some(expires_at) => {
            let seconds = (expires_at - Utc::now()).num_seconds();
            if seconds <= 0 {
                return Err(ApiError::bad_request("expiresAt is in the past"));
            }
            Duration::seconds(seconds)
        }
        None => Duration::days(DEFAULT_MAX_AGE_DAYS),
    };

    let value = token_cookie(token.to_string(), max_age, state.config().secure_cookies())?;
    add_breadcrumb("auth", "Customer access token stored", None);

    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, value)]).into_response())
}

/// Clear the access token cookie.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    ensure_same_origin(&headers)?;

    let value = token_cookie(String::new(), Duration::ZERO, state.config().secure_cookies())?;
    add_breadcrumb("auth", "Customer access token cleared", None);

    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, value)]).into_response())
}

fn token_cookie(value: String, max_age: Duration, secure: bool) -> Result<HeaderValue, ApiError> {
    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build();

    HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| ApiError::bad_request("accessToken contains invalid characters"))
}

/// Reject requests whose `Origin` does not name the `Host` they were sent to.
///
/// Both sides are compared as lowercase `host:port`, filling in the scheme's
/// default port where it is omitted.
fn ensure_same_origin(headers: &HeaderMap) -> Result<(), ApiError> {
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Url::parse(v).ok());
    let host = headers.get(HOST).and_then(|v| v.to_str().ok());

    let authorities = origin.as_ref().and_then(|origin| {
        let default_port = origin.port_or_known_default()?;
        let origin_authority = format!(
            "{}:{default_port}",
            origin.host_str()?.to_ascii_lowercase()
        );
        let host_authority = host_authority(host?, default_port)?;
        Some((origin_authority, host_authority))
    });

    match authorities {
        Some((origin, host)) if origin == host => Ok(()),
        _ => {
            tracing::warn!(
                origin = ?origin.as_ref().map(Url::as_str),
                ?host,
                "Rejected cross-origin token request"
            );
            Err(ApiError::forbidden("cross-origin request"))
        }
    }
}

/// `Host` header as lowercase `host:port`, using `default_port` when none is given.
fn host_authority(host: &str, default_port: u16) -> Option<String> {
    let url = Url::parse(&format!("http://{host}")).ok()?;
    let name = url.host_str()?.to_ascii_lowercase();
    // `Url` drops the port when it equals 80, the default for the `http` scheme used here
    let port = url.port().unwrap_or_else(|| {
        if host.ends_with(":80") {
            80
        } else {
            default_port
        }
    });
    Some(format!("{name}:{port}"))
}
