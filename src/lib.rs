//! mdoc-cbor is a CBOR codec (RFC 8949) and COSE Sign1 envelope (RFC 8152)
//! for ISO 18013-5 mobile documents. The goal is byte-exact fidelity: an
//! mdoc's digests and signatures are computed over specific encoded bytes,
//! and those bytes must still validate after any number of decode/re-encode
//! cycles.
//!
//! To meet that goal, it provides:
//!
//! - A [`Value`] type covering the full CBOR major-type space, including the
//!   undefined simple value as a state distinct from null — map keys are
//!   never dropped because their value is undefined.
//! - An insertion-ordered [`Map`] with integer or text keys. Encoding writes
//!   entries back in the order they were decoded; no canonical re-sorting.
//! - [`Timestamp`], the tag 0 date/time extension, held at millisecond
//!   precision with a stable RFC 3339 text form.
//! - [`DataElement`], the tag 24 nested-CBOR wrapper. Its buffer is captured
//!   on decode without being interpreted and written back verbatim, so the
//!   bytes that issuer digests cover are load-bearing and untouched.
//! - [`encode`]/[`decode`] as pure functions — no state is shared across
//!   calls, and each call owns its buffer and recursion stack.
//! - [`CoseSign1`], the four-element signed envelope, with deterministic
//!   Sig_structure construction and async signer/verifier seams for keys
//!   that live in hardware or behind a service.
//! - A serde bridge ([`to_vec`]/[`from_slice`]) for application types that
//!   don't need hand-built `Value` trees.

mod cose;
mod cursor;
mod data_element;
mod de;
mod decode;
mod encode;
mod error;
mod head;
mod integer;
mod ser;
mod timestamp;
mod value;

pub use self::cose::{
    header, Algorithm, CoseSign1, DecodedSign1, SignerOptions, Verification, VerifierOptions,
    COSE_SIGN1_TAG, SIG_CONTEXT_SIGNATURE1,
};
pub use self::cursor::ByteCursor;
pub use self::data_element::DataElement;
pub use self::de::{from_slice, from_value};
pub use self::decode::{decode, decode_prefix};
pub use self::encode::{encode, encode_into};
pub use self::error::{Error, Result};
pub use self::head::TagType;
pub use self::integer::Integer;
pub use self::ser::{to_value, to_vec};
pub use self::timestamp::Timestamp;
pub use self::value::{Map, MapKey, Value};

/// Maximum container nesting depth the decoder will follow before giving up
/// with [`Error::ParseLimit`]. Real mdoc documents nest a handful of levels;
/// anything past this is a hostile or broken input.
pub const MAX_DEPTH: usize = 100;

#[cfg(test)]
mod test {
    use super::*;

    /// A fixed ISO 18013-5 IssuerSigned structure, assembled by hand:
    ///
    /// ```text
    /// {
    ///   "nameSpaces": {
    ///     "org.iso.18013.5.1": [
    ///       24(<< {"digestID": 0, "random": h'deadbeefdeadbeef',
    ///              "elementIdentifier": "family_name",
    ///              "elementValue": "Doe"} >>),
    ///       24(<< {"digestID": 1, "elementIdentifier": "birth_date",
    ///              "elementValue": 0("1980-01-02T00:00:00.000Z")} >>)
    ///     ]
    ///   },
    ///   "issuerAuth": [h'a10126', {4: h'3131'}, h'636d736f',
    ///                  h'0102030405060708']
    /// }
    /// ```
    fn issuer_signed_fixture() -> Vec<u8> {
        let hex = concat!(
            // top-level map, "nameSpaces"
            "a2",
            "6a6e616d65537061636573",
            // one namespace: "org.iso.18013.5.1" -> array of 2 items
            "a1",
            "716f72672e69736f2e31383031332e352e31",
            "82",
            // item 1: 24(<<74-byte map>>)
            "d818584a",
            "a4",
            "68646967657374494400",
            "6672616e646f6d48deadbeefdeadbeef",
            "71656c656d656e744964656e746966696572",
            "6b66616d696c795f6e616d65",
            "6c656c656d656e7456616c756563446f65",
            // item 2: 24(<<80-byte map>>)
            "d8185850",
            "a3",
            "68646967657374494401",
            "71656c656d656e744964656e746966696572",
            "6a62697274685f64617465",
            "6c656c656d656e7456616c7565",
            "c07818313938302d30312d30325430303a30303a30302e3030305a",
            // "issuerAuth": COSE_Sign1 4-tuple
            "6a69737375657241757468",
            "84",
            "43a10126",
            "a104423131",
            "44636d736f",
            "480102030405060708",
        );
        hex::decode(hex).unwrap()
    }

    #[test]
    fn issuer_signed_document_decodes() {
        let bytes = issuer_signed_fixture();
        let doc = decode(&bytes).unwrap();
        let doc = doc.as_map().unwrap();

        let namespaces = doc.get_text("nameSpaces").unwrap().as_map().unwrap();
        let items = namespaces
            .get_text("org.iso.18013.5.1")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(items.len(), 2);

        // The issuer-signed items are opaque wrappers, only decoded on demand
        let first = items[0].as_data_element().unwrap();
        let first_item = first.decode().unwrap();
        let first_item = first_item.as_map().unwrap();
        assert_eq!(
            first_item.get_text("elementIdentifier").and_then(Value::as_str),
            Some("family_name")
        );
        assert_eq!(
            first_item.get_text("elementValue").and_then(Value::as_str),
            Some("Doe")
        );

        let second = items[1].as_data_element().unwrap().decode().unwrap();
        let birth_date = second.as_map().unwrap().get_text("elementValue").unwrap();
        assert_eq!(
            birth_date.as_timestamp().map(|t| t.to_rfc3339()),
            Some("1980-01-02T00:00:00.000Z".to_string())
        );

        // The issuerAuth element parses as a COSE Sign1 envelope
        let issuer_auth = encode(&doc.get_text("issuerAuth").unwrap().clone());
        let envelope = CoseSign1::from_bytes(&issuer_auth).unwrap();
        assert_eq!(envelope.protected(), &[0xa1, 0x01, 0x26]);
        assert_eq!(
            envelope.unprotected().get_int(header::KID).and_then(Value::as_bytes),
            Some(&b"11"[..])
        );
        assert_eq!(envelope.signature(), Some(&[1u8, 2, 3, 4, 5, 6, 7, 8][..]));
    }

    /// The integrity property the whole crate exists for: decode → encode
    /// reproduces the document byte for byte, wrapper buffers included.
    #[test]
    fn issuer_signed_document_survives_reencode() {
        let bytes = issuer_signed_fixture();
        let doc = decode(&bytes).unwrap();
        assert_eq!(encode(&doc), bytes);

        // And the wrapper buffers specifically are untouched
        let items_hex = hex::encode(&bytes);
        let doc = decode(&bytes).unwrap();
        let first_buffer = doc["nameSpaces"]["org.iso.18013.5.1"][0]
            .as_data_element()
            .unwrap()
            .as_bytes();
        assert!(items_hex.contains(&hex::encode(first_buffer)));
    }

    #[test]
    fn data_element_byte_fidelity_through_wire() {
        let mut inner = Map::new();
        inner.insert("digestID", 7u64);
        inner.insert("elementValue", Value::F64(1.5));
        let original = DataElement::from_value(&Value::Map(inner));
        let original_bytes = original.as_bytes().to_vec();

        let wire = encode(&Value::Array(vec![
            Value::from("padding"),
            Value::DataElement(original),
        ]));
        let back = decode(&wire).unwrap();
        let back = back[1].as_data_element().unwrap();
        assert_eq!(back.as_bytes(), &original_bytes[..]);
    }

    #[test]
    fn random_integers_roundtrip() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let v: i64 = rng.gen();
            let value = Value::from(v);
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
        for _ in 0..1000 {
            let v: u64 = rng.gen();
            let value = Value::from(v);
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }

    #[test]
    fn random_floats_roundtrip() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let v: f64 = rng.gen();
            let value = Value::F64(v);
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }
}
