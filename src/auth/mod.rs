//! Browser session subsystem.
//!
//! # Data Flow
//! ```text
//! login:   credentials → auth service → login.rs (token, user) → cookie.rs (Set-Cookie)
//! request: Cookie / Authorization → session.rs (Session extractor) → upstream bearer
//! logout:  Session → logout.rs (one upstream call per token) → cookie cleared
//! ```
//!
//! # Design Decisions
//! - The token is never exposed to scripts (HttpOnly cookie)
//! - Token issuance stays with the external auth service
//! - Logout always clears the cookie, even when the upstream call fails

pub mod cookie;
pub mod login;
pub mod logout;
pub mod session;

pub use cookie::{clear_cookie, read_cookie, session_cookie};
pub use login::{extract_expires_in, extract_token, SessionUser};
pub use logout::LogoutGuard;
pub use session::{token_from_headers, Session};
