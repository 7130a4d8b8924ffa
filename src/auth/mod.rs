pub mod extractors;
pub mod jwt;
pub mod password;
pub mod revocation;

pub use extractors::AuthUser;
