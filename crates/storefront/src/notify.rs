//! Shopper-facing notices for failed backend calls.
//!
//! Notices reach the page through an `HX-Trigger` response header carrying a
//! `notify` event, which the layout's toast handler displays. A handler emits
//! at most one notice per operation, after the retry policy has given up.

use std::convert::Infallible;
use std::fmt::Write as _;

use axum::http::HeaderValue;
use axum::response::{IntoResponseParts, ResponseParts};
use serde::Serialize;
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::retry::{FailureClass, OperationKind};

/// HTMX response header that fires client-side events.
pub const HX_TRIGGER: &str = "HX-Trigger";

const CONNECTIVITY_MESSAGE: &str =
    "We couldn't reach the store. Check your connection and try again.";
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Severity shown on the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// A toast shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub dismissible: bool,
    /// Offer a "reload" action.
    pub reload: bool,
}

impl Notice {
    /// The store could not be reached.
    #[must_use]
    pub fn connectivity() -> Self {
        Self {
            level: NoticeLevel::Error,
            message: CONNECTIVITY_MESSAGE.to_string(),
            dismissible: true,
            reload: true,
        }
    }

    /// An action failed for an unspecified reason.
    #[must_use]
    pub fn generic() -> Self {
        Self {
            level: NoticeLevel::Error,
            message: GENERIC_MESSAGE.to_string(),
            dismissible: true,
            reload: false,
        }
    }

    /// The backend rejected an action with a message for the shopper.
    #[must_use]
    pub fn business(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            dismissible: true,
            reload: false,
        }
    }

    /// The notice for an operation that failed after all retries.
    ///
    /// Reads notify only for connectivity-class failures (transport, rate
    /// limit, server, unclassified); client errors on reads are left to the
    /// caller. Writes always notify: with the backend's message for
    /// business-rule failures, otherwise generically.
    #[must_use]
    pub fn for_terminal_failure(kind: OperationKind, error: &ShopifyError) -> Option<Self> {
        let class = FailureClass::of(error);
        match kind {
            OperationKind::Read => class.is_retryable().then(Self::connectivity),
            OperationKind::Write => Some(match class {
                FailureClass::BusinessRule(message) => Self::business(message),
                _ => Self::generic(),
            }),
        }
    }

    /// `HX-Trigger` header value: `{"notify": {...}}`.
    ///
    /// Non-ASCII characters are `\u` escaped so the value is a valid header.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        let json = serde_json::json!({ "notify": self }).to_string();
        HeaderValue::from_str(&escape_non_ascii(&json)).ok()
    }
}

impl IntoResponseParts for Notice {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match self.header_value() {
            Some(value) => {
                res.headers_mut().insert(HX_TRIGGER, value);
            }
            None => warn!(message = %self.message, "Notice could not be encoded as a header"),
        }
        Ok(res)
    }
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0_u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}
