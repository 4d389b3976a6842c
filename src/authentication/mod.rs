pub mod http;
mod jwt;

pub use jwt::{JwtError, JwtKeys, TokenClaims};
