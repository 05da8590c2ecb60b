//! Auth domain - verification of access tokens issued by the auth provider.

pub mod jwt;

pub use jwt::{Claims, JwtService};
