mod claims;
pub(crate) mod extractors;

pub use claims::{Claims, TokenKind};
pub use extractors::AuthUser;
