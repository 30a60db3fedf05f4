pub mod claims;
pub mod codec;
pub mod errors;
pub mod issuer;

pub use claims::Claims;
pub use claims::PASSWORD_RESET_SCOPE;
pub use codec::TokenCodec;
pub use errors::JwtError;
pub use issuer::TokenIssuer;
pub use issuer::TokenLifetimes;
