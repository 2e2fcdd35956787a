//! Cookie-backed storage for the selected currency.

use std::sync::{Arc, Mutex, PoisonError};

use axum::http::{HeaderMap, HeaderValue, header};
use harbor_core::CurrencyCode;
use thiserror::Error;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};

/// Currency cookie lifetime.
const COOKIE_MAX_AGE_DAYS: i64 = 365;

/// Errors reading or writing the currency cookie.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookie header is not valid UTF-8")]
    InvalidHeader,
    #[error("cookie value cannot be encoded: {0}")]
    Encode(String),
    #[error("cookie storage unavailable")]
    Unavailable,
}

/// Read/write access to the saved currency.
pub trait CurrencyCookie {
    /// The raw saved value, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying storage cannot be read.
    fn read(&self) -> Result<Option<String>, CookieError>;

    /// Persist `code`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be stored.
    fn write(&mut self, code: &CurrencyCode) -> Result<(), CookieError>;
}

// =============================================================================
// Request cookie
// =============================================================================

/// Currency cookie for one HTTP request.
///
/// Reads from the request's `Cookie` headers; a write is held as a pending
/// `Set-Cookie` value for the response.
#[derive(Debug, Clone)]
pub struct RequestCurrencyCookie {
    name: String,
    secure: bool,
    value: Result<Option<String>, CookieError>,
    pending: Option<HeaderValue>,
}

impl RequestCurrencyCookie {
    /// Read the cookie named `name` from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, name: &str, secure: bool) -> Self {
        Self {
            name: name.to_string(),
            secure,
            value: read_cookie(headers, name),
            pending: None,
        }
    }

    /// Take the `Set-Cookie` header produced by the last write.
    pub fn take_set_cookie(&mut self) -> Option<HeaderValue> {
        self.pending.take()
    }
}

impl CurrencyCookie for RequestCurrencyCookie {
    fn read(&self) -> Result<Option<String>, CookieError> {
        self.value.clone()
    }

    fn write(&mut self, code: &CurrencyCode) -> Result<(), CookieError> {
        let cookie = Cookie::build((self.name.clone(), code.as_str().to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
            .build();

        let header = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| CookieError::Encode(e.to_string()))?;
        self.pending = Some(header);
        self.value = Ok(Some(code.as_str().to_string()));
        Ok(())
    }
}

/// Value of the request cookie called `name`.
pub(crate) fn read_cookie(
    headers: &HeaderMap,
    name: &str,
) -> Result<Option<String>, CookieError> {
    for value in headers.get_all(header::COOKIE) {
        let raw = value.to_str().map_err(|_| CookieError::InvalidHeader)?;
        if let Some(cookie) = Cookie::split_parse(raw)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
        {
            return Ok(Some(cookie.value().to_string()));
        }
    }
    Ok(None)
}

/// Whether `headers` already set the cookie called `name`.
#[must_use]
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v).ok())
        .any(|c| c.name() == name)
}

// =============================================================================
// In-memory cookie
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    value: Option<String>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// Shared in-memory currency storage.
///
/// Clones share the same value, so a store can own one handle while the
/// caller inspects another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCurrencyCookie {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCurrencyCookie {
    /// Storage holding `value`.
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        let cookie = Self::default();
        cookie.lock().value = Some(value.into());
        cookie
    }

    /// Current saved value.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.lock().value.clone()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Make subsequent reads fail.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Make subsequent writes fail.
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CurrencyCookie for InMemoryCurrencyCookie {
    fn read(&self) -> Result<Option<String>, CookieError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(CookieError::Unavailable);
        }
        Ok(state.value.clone())
    }

    fn write(&mut self, code: &CurrencyCode) -> Result<(), CookieError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(CookieError::Unavailable);
        }
        state.value = Some(code.as_str().to_string());
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_reads_named_cookie() {
        let cookie = RequestCurrencyCookie::from_headers(
            &headers("session=abc; harbor_currency=EUR; other=1"),
            "harbor_currency",
            false,
        );
        assert_eq!(cookie.read().unwrap().as_deref(), Some("EUR"));
    }

    #[test]
    fn test_missing_cookie_reads_none() {
        let cookie =
            RequestCurrencyCookie::from_headers(&headers("session=abc"), "harbor_currency", false);
        assert_eq!(cookie.read().unwrap(), None);
    }

    #[test]
    fn test_invalid_header_reads_error() {
        let mut map = HeaderMap::new();
        map.insert(
            header::COOKIE,
            HeaderValue::from_bytes(b"harbor_currency=\xffEUR").unwrap(),
        );
        let cookie = RequestCurrencyCookie::from_headers(&map, "harbor_currency", false);
        assert_eq!(cookie.read(), Err(CookieError::InvalidHeader));
    }

    #[test]
    fn test_write_produces_set_cookie() {
        let mut cookie = RequestCurrencyCookie::from_headers(&HeaderMap::new(), "cur", true);
        cookie.write(&CurrencyCode::parse("PLN").unwrap()).unwrap();

        let header = cookie.take_set_cookie().unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with("cur=PLN"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Secure"));
        assert!(header.contains("Max-Age=31536000"));

        assert_eq!(cookie.read().unwrap().as_deref(), Some("PLN"));
        assert!(cookie.take_set_cookie().is_none());
    }

    #[test]
    fn test_sets_cookie_detects_name() {
        let mut map = HeaderMap::new();
        map.append(
            header::SET_COOKIE,
            HeaderValue::from_static("harbor_currency=EUR; Path=/"),
        );
        assert!(sets_cookie(&map, "harbor_currency"));
        assert!(!sets_cookie(&map, "other"));
    }

    #[test]
    fn test_in_memory_counts_writes_and_fails() {
        let shared = InMemoryCurrencyCookie::default();
        let mut handle = shared.clone();
        handle.write(&CurrencyCode::parse("EUR").unwrap()).unwrap();
        assert_eq!(shared.value().as_deref(), Some("EUR"));
        assert_eq!(shared.writes(), 1);

        shared.fail_writes();
        assert!(handle.write(&CurrencyCode::parse("USD").unwrap()).is_err());
        assert_eq!(shared.writes(), 1);

        shared.fail_reads();
        assert_eq!(handle.read(), Err(CookieError::Unavailable));
    }
}
