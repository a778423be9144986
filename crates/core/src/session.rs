//! Session lifetime policy shared by token issuing and the client-side
//! inactivity timer.
//!
//! The browser auto-logout timer and the JWT expiry must agree; both read
//! this constant (the API serves it at `GET /auth/session-policy`).

/// Access-token lifetime and client inactivity timeout, in seconds.
pub const SESSION_TIMEOUT_SECS: i64 = 900;

/// Access-token lifetime in minutes, for `JwtConfig` defaults.
pub const SESSION_TIMEOUT_MINS: i64 = SESSION_TIMEOUT_SECS / 60;
