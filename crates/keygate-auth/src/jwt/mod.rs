//! Signed bearer token encoding, decoding, and claims.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{Claims, TokenType};
pub use decoder::TokenVerifier;
pub use encoder::{IssuedBearer, TokenIssuer};
