//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policy)
//! 5. Session layer (tower-sessions, `PostgreSQL` or in-memory store)
//! 6. Currency (resolve the active currency, write back the cookie)

pub mod currency;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use currency::{currency_middleware, request_locale};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, memory_store, postgres_store};
