//! Per-request currency resolution.

use axum::{
    extract::{Request, State},
    http::header::{ACCEPT_LANGUAGE, SET_COOKIE},
    middleware::Next,
    response::Response,
};
use harbor_core::Locale;

use crate::currency::cookie::sets_cookie;
use crate::currency::{ActiveCurrency, CurrencyStore, RequestCurrencyCookie};
use crate::state::AppState;

/// Highest-priority locale from `Accept-Language`.
#[must_use]
pub fn request_locale(headers: &axum::http::HeaderMap) -> Option<Locale> {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(Locale::preferred_from_accept_language)
}

/// Resolve the active currency and expose it as [`ActiveCurrency`].
///
/// When resolution wrote the cookie (no valid saved value), the `Set-Cookie`
/// header is appended to the response unless the handler already set the
/// currency cookie itself.
pub async fn currency_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = &state.config().currency;
    let locale = request_locale(request.headers());
    let cookie = RequestCurrencyCookie::from_headers(
        request.headers(),
        &config.cookie_name,
        state.config().secure_cookies(),
    );

    let mut store = CurrencyStore::new(state.currencies(), cookie);
    let active = store.resolve(locale.as_ref()).clone();
    let set_cookie = store.into_cookie().take_set_cookie();

    request.extensions_mut().insert(ActiveCurrency(active));

    let mut response = next.run(request).await;

    if let Some(value) = set_cookie
        && !sets_cookie(response.headers(), &config.cookie_name)
    {
        response.headers_mut().append(SET_COOKIE, value);
    }

    response
}
