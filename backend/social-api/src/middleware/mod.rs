//! Social API middleware: session tokens and resolver guards

pub mod auth;
pub mod jwt;

pub use auth::{is_admin, is_authenticated, is_message_owner, is_post_owner};
pub use jwt::{authenticate, create_token, verify_token, Authentication, Claims, JwtMiddleware};
