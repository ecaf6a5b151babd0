//! Session token primitives shared by Sociogram services.
//!
//! The feed service issues tokens at signup/login and verifies them on every
//! authenticated request; both sides go through [`jwt::JwtKeys`].

pub mod jwt;

pub use jwt::{Claims, JwtKeys, TokenError};
