use std::fmt;

use serde::{de, ser};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Occurs when the serde bridge is handed a value kind that has no CBOR
    /// encoding rule, like an out-of-range 128-bit integer or a map key that is
    /// neither an integer nor text.
    UnsupportedType(String),
    /// Occurs when the decoder hits a reserved or invalid head byte, an
    /// indefinite-length item, a tag whose payload has the wrong shape, or text
    /// that isn't valid UTF-8.
    MalformedEncoding(String),
    /// Decoder needed more bytes than the buffer supplies. Signals a corrupt or
    /// incomplete transport delivery.
    TruncatedInput {
        step: &'static str,
        needed: usize,
        remaining: usize,
    },
    /// Decoder exceeded the maximum allowed nesting depth.
    ParseLimit(String),
    /// `verify` was called on an envelope that carries no signature.
    MissingSignature,
    /// Failure reported by an external signer or verifier callback. Propagated
    /// to the caller of `sign`/`verify` without any internal recovery.
    Crypto(String),
    /// Occurs when serde serialization or deserialization fails.
    SerdeFail(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnsupportedType(ref kind) => {
                write!(f, "No CBOR encoding rule for value kind: {}", kind)
            }
            Error::MalformedEncoding(ref err) => write!(f, "Malformed CBOR encoding: {}", err),
            Error::TruncatedInput {
                step,
                needed,
                remaining,
            } => write!(
                f,
                "Input truncated: needed {} bytes, but only {} remain on step [{}]",
                needed, remaining, step
            ),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
            Error::MissingSignature => write!(f, "Envelope has no signature to verify"),
            Error::Crypto(ref err) => write!(f, "Cryptographic callback failure: {}", err),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
