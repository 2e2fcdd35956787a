//! Currency selection handlers.

use axum::{
    Extension, Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::is_htmx;
use crate::currency::{ActiveCurrency, CurrencyStore, RequestCurrencyCookie};
use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Currency selector form data.
#[derive(Debug, Deserialize)]
pub struct SetCurrencyForm {
    pub currency: String,
    pub return_to: Option<String>,
}

/// Currency settings returned by `GET /api/currency`.
#[derive(Debug, Serialize)]
pub struct CurrencyResponse {
    pub active: String,
    pub base: String,
    pub supported: Vec<String>,
}

/// Select the active currency.
///
/// Unsupported codes are rejected with 400 and leave the cookie untouched.
/// HTMX requests get `HX-Refresh` so every price on the page re-renders;
/// plain form posts are redirected back to `return_to`.
#[instrument(skip(state, headers))]
pub async fn set(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SetCurrencyForm>,
) -> Result<Response> {
    let config = state.config();
    let cookie = RequestCurrencyCookie::from_headers(
        &headers,
        &config.currency.cookie_name,
        config.secure_cookies(),
    );

    let mut store = CurrencyStore::new(state.currencies(), cookie);
    let selected = store.set_currency(&form.currency)?.clone();

    add_breadcrumb("currency", "Currency selected", Some(&[("code", selected.as_str())]));

    let set_cookie = store.into_cookie().take_set_cookie();
    let cookies = AppendHeaders(set_cookie.map(|value| (SET_COOKIE, value)));

    if is_htmx(&headers) {
        return Ok((
            StatusCode::NO_CONTENT,
            cookies,
            AppendHeaders([("HX-Refresh", "true")]),
        )
            .into_response());
    }

    let target = form
        .return_to
        .as_deref()
        .filter(|path| is_safe_return_path(path))
        .unwrap_or("/");

    Ok((cookies, Redirect::to(target)).into_response())
}

/// Active, base and supported currencies.
pub async fn show(
    State(state): State<AppState>,
    Extension(ActiveCurrency(active)): Extension<ActiveCurrency>,
) -> Json<CurrencyResponse> {
    let shop = state.currencies();
    Json(CurrencyResponse {
        active: active.to_string(),
        base: shop.base().to_string(),
        supported: shop.supported().iter().map(ToString::to_string).collect(),
    })
}

/// Local absolute paths only; no scheme-relative or external targets.
fn is_safe_return_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
