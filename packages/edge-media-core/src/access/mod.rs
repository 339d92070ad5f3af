pub mod auth;
pub mod origin;

pub use auth::{Authenticator, BearerTokenAuthenticator};
pub use origin::{ALLOW_HEADERS, ALLOW_METHODS, CorsHeaders, DISALLOWED_ORIGIN, OriginPolicy};
