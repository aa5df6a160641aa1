pub mod claims;
pub mod jwt_helper;

pub use claims::Claims;
pub use jwt_helper::JwtKeys;
