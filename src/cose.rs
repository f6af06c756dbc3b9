//! COSE Sign1 envelope (RFC 8152 §4.2).
//!
//! An envelope is the 4-tuple `[protected, unprotected, payload, signature]`.
//! The protected header is held as its CBOR-encoded bytes — those exact bytes
//! participate in the signed Sig_structure, so they are never re-derived from
//! a decoded view. The cryptographic work itself is delegated outward: `sign`
//! and `verify` each build the deterministic to-be-signed byte sequence and
//! make exactly one call to a caller-supplied async callback, which may be
//! backed by a hardware key store or a remote signing service.

use std::future::Future;

use crate::decode::decode;
use crate::encode::encode;
use crate::error::{Error, Result};
use crate::value::{Map, MapKey, Value};

/// Tag number for an enclosed COSE_Sign1 message. Accepted and stripped on
/// decode; never written on encode.
pub const COSE_SIGN1_TAG: u64 = 18;

/// Context string for the Signature1 Sig_structure.
pub const SIG_CONTEXT_SIGNATURE1: &str = "Signature1";

/// COSE header parameter labels consumed by this crate (IANA COSE Header
/// Parameters registry).
pub mod header {
    /// `alg`: the signature algorithm, in the protected header.
    pub const ALG: i64 = 1;
    /// `kid`: key identifier, expected on the unprotected header.
    pub const KID: i64 = 4;
    /// `x5chain`: signer certificate bytes, on the unprotected header.
    pub const X5CHAIN: i64 = 33;
}

/// Supported COSE signature algorithms (IANA COSE Algorithms registry).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA w/ SHA-256 over P-256.
    Es256,
    /// ECDSA w/ SHA-384 over P-384.
    Es384,
    /// ECDSA w/ SHA-512 over P-521.
    Es512,
    /// EdDSA (Ed25519/Ed448).
    EdDsa,
}

impl Algorithm {
    /// The registered COSE integer label.
    pub fn label(self) -> i64 {
        match self {
            Algorithm::Es256 => -7,
            Algorithm::Es384 => -35,
            Algorithm::Es512 => -36,
            Algorithm::EdDsa => -8,
        }
    }

    /// Convert from a COSE integer label. Returns `None` for labels outside
    /// the supported set.
    pub fn from_label(label: i64) -> Option<Algorithm> {
        match label {
            -7 => Some(Algorithm::Es256),
            -35 => Some(Algorithm::Es384),
            -36 => Some(Algorithm::Es512),
            -8 => Some(Algorithm::EdDsa),
            _ => None,
        }
    }

    /// The JOSE-style algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
            Algorithm::Es512 => "ES512",
            Algorithm::EdDsa => "EdDSA",
        }
    }

    /// Convert from an algorithm name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Algorithm> {
        match name {
            "ES256" => Some(Algorithm::Es256),
            "ES384" => Some(Algorithm::Es384),
            "ES512" => Some(Algorithm::Es512),
            "EdDSA" => Some(Algorithm::EdDsa),
            _ => None,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Es256
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Context handed to the external signer callback.
#[derive(Debug, Clone, Default)]
pub struct SignerOptions {
    pub algorithm: Algorithm,
    pub kid: Option<Vec<u8>>,
}

/// Context handed to the external verifier callback.
#[derive(Debug, Clone, Default)]
pub struct VerifierOptions {
    pub algorithm: Algorithm,
    pub kid: Option<Vec<u8>>,
    pub certificate: Option<Vec<u8>>,
}

/// Outcome of [`CoseSign1::verify`]: the verifier's judgment paired with the
/// decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub verified: bool,
    pub payload: Value,
}

/// Decoded view of an envelope, for inspection. The unprotected header and
/// signature are carried as-is; protected header and payload are decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSign1 {
    pub protected: Map,
    pub unprotected: Map,
    pub payload: Value,
    pub signature: Option<Vec<u8>>,
}

/// A COSE Sign1 message.
///
/// Construct one of two ways: from parts on the signing path, or with
/// [`CoseSign1::from_bytes`] on the verification path. Once a signature is
/// present the envelope is treated as immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct CoseSign1 {
    protected: Vec<u8>,
    unprotected: Map,
    payload: Vec<u8>,
    signature: Option<Vec<u8>>,
}

impl CoseSign1 {
    /// Start an unsigned envelope around a payload.
    pub fn new(payload: Vec<u8>) -> CoseSign1 {
        CoseSign1 {
            protected: Vec::new(),
            unprotected: Map::new(),
            payload,
            signature: None,
        }
    }

    pub fn from_parts(
        protected: Vec<u8>,
        unprotected: Map,
        payload: Vec<u8>,
        signature: Option<Vec<u8>>,
    ) -> CoseSign1 {
        CoseSign1 {
            protected,
            unprotected,
            payload,
            signature,
        }
    }

    /// Decode an envelope from its wire bytes.
    ///
    /// An optional outer COSE_Sign1 tag (18) is tolerated. Anything other
    /// than a 4-element array underneath fails with `MalformedEncoding`. An
    /// empty signature byte string decodes as "unsigned".
    pub fn from_bytes(buf: &[u8]) -> Result<CoseSign1> {
        // Tag 18 isn't in the recognized-tag table, so the decoder has
        // already stripped it and handed back the array
        let items = match decode(buf)? {
            Value::Array(items) => {
                if items.len() != 4 {
                    return Err(Error::MalformedEncoding(format!(
                        "COSE_Sign1 array has {} elements, expected 4",
                        items.len()
                    )));
                }
                items
            }
            other => {
                return Err(Error::MalformedEncoding(format!(
                    "COSE_Sign1 message must be an array, got {}",
                    other.kind()
                )))
            }
        };

        let mut items = items.into_iter();
        let protected = match items.next().expect("len checked") {
            Value::Bytes(b) => b,
            other => {
                return Err(Error::MalformedEncoding(format!(
                    "Protected header must be a byte string, got {}",
                    other.kind()
                )))
            }
        };
        let unprotected = match items.next().expect("len checked") {
            Value::Map(m) => m,
            other => {
                return Err(Error::MalformedEncoding(format!(
                    "Unprotected header must be a map, got {}",
                    other.kind()
                )))
            }
        };
        let payload = match items.next().expect("len checked") {
            Value::Bytes(b) => b,
            other => {
                return Err(Error::MalformedEncoding(format!(
                    "Payload must be a byte string, got {}",
                    other.kind()
                )))
            }
        };
        let signature = match items.next().expect("len checked") {
            Value::Bytes(b) => {
                if b.is_empty() {
                    None
                } else {
                    Some(b)
                }
            }
            other => {
                return Err(Error::MalformedEncoding(format!(
                    "Signature must be a byte string, got {}",
                    other.kind()
                )))
            }
        };

        Ok(CoseSign1 {
            protected,
            unprotected,
            payload,
            signature,
        })
    }

    /// The protected header's raw CBOR bytes.
    pub fn protected(&self) -> &[u8] {
        &self.protected
    }

    pub fn unprotected(&self) -> &Map {
        &self.unprotected
    }

    pub fn unprotected_mut(&mut self) -> &mut Map {
        &mut self.unprotected
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Build and store the protected header from name-keyed fields.
    ///
    /// The `alg` field's textual name is resolved through the algorithm table,
    /// defaulting to ES256 when absent or unrecognized, and written under its
    /// numeric label. A `kid` field is *not* carried into the protected header
    /// — mdoc readers expect `kid` on the unprotected header, and carrying it
    /// here would change the signed bytes of existing documents; set it via
    /// [`unprotected_mut`](Self::unprotected_mut) instead. All other fields
    /// are copied through unchanged.
    pub fn set_protected_header(&mut self, fields: &Map) {
        let algorithm = fields
            .get_text("alg")
            .and_then(Value::as_str)
            .and_then(Algorithm::from_name)
            .unwrap_or_default();
        let mut map = Map::with_capacity(fields.len() + 1);
        map.insert(header::ALG, algorithm.label());
        for (key, value) in fields.iter() {
            if let MapKey::Text(name) = key {
                if name == "alg" || name == "kid" {
                    continue;
                }
            }
            map.insert(key.clone(), value.clone());
        }
        self.protected = encode(&Value::Map(map));
    }

    /// The raw 4-tuple view, with an unset signature surfacing as an empty
    /// byte string.
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Bytes(self.protected.clone()),
            Value::Map(self.unprotected.clone()),
            Value::Bytes(self.payload.clone()),
            Value::Bytes(self.signature.clone().unwrap_or_default()),
        ])
    }

    /// Encode the envelope to its wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.to_value())
    }

    /// Decode the protected header and payload for inspection.
    pub fn decoded(&self) -> Result<DecodedSign1> {
        Ok(DecodedSign1 {
            protected: self.decode_protected()?,
            unprotected: self.unprotected.clone(),
            payload: decode(&self.payload)?,
            signature: self.signature.clone(),
        })
    }

    /// The deterministic to-be-signed byte sequence:
    /// `["Signature1", protected, h'', payload]`, CBOR-encoded.
    fn sig_structure(&self) -> Vec<u8> {
        encode(&Value::Array(vec![
            Value::Text(SIG_CONTEXT_SIGNATURE1.to_string()),
            Value::Bytes(self.protected.clone()),
            Value::Bytes(Vec::new()),
            Value::Bytes(self.payload.clone()),
        ]))
    }

    fn kid(&self) -> Option<Vec<u8>> {
        self.unprotected
            .get_int(header::KID)
            .and_then(Value::as_bytes)
            .map(<[u8]>::to_vec)
    }

    /// An empty protected byte string decodes as an empty map.
    fn decode_protected(&self) -> Result<Map> {
        if self.protected.is_empty() {
            return Ok(Map::new());
        }
        match decode(&self.protected)? {
            Value::Map(m) => Ok(m),
            other => Err(Error::MalformedEncoding(format!(
                "Protected header must hold a map, got {}",
                other.kind()
            ))),
        }
    }

    /// Read the algorithm out of the protected header. An absent label or the
    /// sentinel 0 falls back to ES256, as does any label outside the
    /// supported set — permissive by design, kept for compatibility with
    /// documents in the field.
    fn protected_algorithm(&self) -> Result<Algorithm> {
        let protected = self.decode_protected()?;
        Ok(match protected.get_int(header::ALG).and_then(Value::as_i64) {
            None | Some(0) => Algorithm::default(),
            Some(label) => Algorithm::from_label(label).unwrap_or_default(),
        })
    }

    /// Sign the envelope's payload.
    ///
    /// Builds the Sig_structure bytes and awaits the external signer once,
    /// handing it the bytes to sign, the key material, and
    /// [`SignerOptions`] carrying the resolved algorithm (defaulting to
    /// ES256) and any `kid` from the unprotected header. On success the
    /// signature is stored and the encoded wire message returned; a signer
    /// failure propagates unchanged and no partial signature is ever stored.
    pub async fn sign<F, Fut>(
        &mut self,
        key: &[u8],
        algorithm: Option<&str>,
        signer: F,
    ) -> Result<Vec<u8>>
    where
        F: FnOnce(Vec<u8>, Vec<u8>, SignerOptions) -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        let algorithm = algorithm.and_then(Algorithm::from_name).unwrap_or_default();
        let options = SignerOptions {
            algorithm,
            kid: self.kid(),
        };
        let signature = signer(self.sig_structure(), key.to_vec(), options).await?;
        self.signature = Some(signature);
        Ok(self.encode())
    }

    /// Verify the envelope's signature.
    ///
    /// Fails with [`Error::MissingSignature`] before the verifier is ever
    /// invoked if no signature is present. Otherwise rebuilds the identical
    /// Sig_structure bytes used at signing time and awaits the external
    /// verifier once, handing it [`VerifierOptions`] carrying the algorithm
    /// resolved from the protected header (see
    /// [`Algorithm`] fallbacks above), plus `kid` and certificate bytes from
    /// the unprotected header. Key identity and certificate chains are the
    /// verifier's judgment, not this crate's.
    pub async fn verify<F, Fut>(&self, verifier: F) -> Result<Verification>
    where
        F: FnOnce(Vec<u8>, Vec<u8>, VerifierOptions) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let signature = self.signature.clone().ok_or(Error::MissingSignature)?;
        let options = VerifierOptions {
            algorithm: self.protected_algorithm()?,
            kid: self.kid(),
            certificate: self
                .unprotected
                .get_int(header::X5CHAIN)
                .and_then(Value::as_bytes)
                .map(<[u8]>::to_vec),
        };
        let verified = verifier(self.sig_structure(), signature, options).await?;
        Ok(Verification {
            verified,
            payload: decode(&self.payload)?,
        })
    }
}
