//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, signed cookie)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers (CSP, frame options, etc.)
//! 6. Rate limiting on credential posts and the JSON API (governor)
//!
//! Authentication and role checks are extractors, not layers; see [`auth`].

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, RequireBuyer, RequireVendor, clear_current_user, set_current_user,
};
pub use flash::{PageContext, push_flash, take_flash};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, create_session_store};
