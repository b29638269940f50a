//! Error types for the Concord core primitives

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    #[error("DER encoding error: {0}")]
    Encode(String),

    #[error("DER decoding error: {0}")]
    Decode(String),

    #[error("Trailing bytes after DER value: {0} bytes left")]
    TrailingBytes(usize),

    #[error("Generation counter exhausted at {0}")]
    GenerationExhausted(i64),

    #[error("Negative generation value: {0}")]
    NegativeGeneration(i64),

    #[error("Incomplete key bag: missing {0}")]
    IncompleteKeyBag(&'static str),
}
