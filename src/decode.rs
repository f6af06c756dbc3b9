//! CBOR decoding into [`Value`] trees.
//!
//! Decoding reads exactly one item; trailing bytes after it are not an error,
//! since callers hand each decode an exact-size buffer and nested structures
//! are carried as byte strings. Two behaviors here are deliberately
//! permissive and documented rather than hidden:
//!
//! - A tag outside the recognized set decodes to its bare payload; the tag
//!   number is discarded.
//! - The algorithm-label fallbacks live in the COSE layer, not here.
//!
//! Indefinite-length items are rejected outright — ISO 18013-5 requires
//! definite-length encoding throughout.

use crate::cursor::ByteCursor;
use crate::data_element::DataElement;
use crate::error::{Error, Result};
use crate::head::{self, Major, TagType};
use crate::integer::Integer;
use crate::timestamp::Timestamp;
use crate::value::{Map, MapKey, Value};
use crate::MAX_DEPTH;

/// Decode one CBOR item from the front of `buf`.
pub fn decode(buf: &[u8]) -> Result<Value> {
    decode_prefix(buf).map(|(value, _)| value)
}

/// Decode one CBOR item and also return the number of bytes it occupied.
pub fn decode_prefix(buf: &[u8]) -> Result<(Value, usize)> {
    let mut cursor = ByteCursor::new(buf);
    let value = read_value(&mut cursor, 0)?;
    Ok((value, cursor.position()))
}

/// Read the argument selected by the low 5 bits of a head byte.
fn read_argument(cursor: &mut ByteCursor, info: u8, step: &'static str) -> Result<u64> {
    match info {
        0..=23 => Ok(info as u64),
        head::ARG_U8 => Ok(cursor.read_u8(step)? as u64),
        head::ARG_U16 => Ok(cursor.read_u16(step)? as u64),
        head::ARG_U32 => Ok(cursor.read_u32(step)? as u64),
        head::ARG_U64 => cursor.read_u64(step),
        head::ARG_INDEFINITE => Err(Error::MalformedEncoding(format!(
            "Indefinite-length items are not supported (step [{}])",
            step
        ))),
        _ => Err(Error::MalformedEncoding(format!(
            "Reserved additional-info value {} (step [{}])",
            info, step
        ))),
    }
}

fn read_length(cursor: &mut ByteCursor, info: u8, step: &'static str) -> Result<usize> {
    let len = read_argument(cursor, info, step)?;
    usize::try_from(len)
        .map_err(|_| Error::MalformedEncoding(format!("Length {} overflows usize", len)))
}

fn read_value(cursor: &mut ByteCursor, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(Error::ParseLimit("Depth limit exceeded".to_string()));
    }
    let byte = cursor.read_u8("read head byte")?;
    let info = byte & 0x1f;
    Ok(match Major::from_u8(byte) {
        Major::Unsigned => {
            Value::Int(Integer::from(read_argument(cursor, info, "decode unsigned")?))
        }
        Major::Negative => {
            let n = read_argument(cursor, info, "decode negative")?;
            if n > i64::MAX as u64 {
                return Err(Error::MalformedEncoding(format!(
                    "Negative integer -1-{} exceeds representable range",
                    n
                )));
            }
            Value::Int(Integer::from(-1 - n as i64))
        }
        Major::Bytes => {
            let len = read_length(cursor, info, "decode byte string length")?;
            Value::Bytes(cursor.read_bytes(len, "decode byte string")?.to_vec())
        }
        Major::Text => Value::Text(read_text(cursor, info)?),
        Major::Array => {
            let len = read_length(cursor, info, "decode array length")?;
            let mut v = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                v.push(read_value(cursor, depth + 1)?);
            }
            Value::Array(v)
        }
        Major::Map => {
            let len = read_length(cursor, info, "decode map length")?;
            let mut map = Map::with_capacity(len.min(4096));
            for _ in 0..len {
                let key = read_map_key(cursor)?;
                let value = read_value(cursor, depth + 1)?;
                map.insert(key, value);
            }
            Value::Map(map)
        }
        Major::Tag => {
            let tag = read_argument(cursor, info, "decode tag number")?;
            read_tagged(cursor, tag, depth)?
        }
        Major::Simple => read_simple(cursor, info)?,
    })
}

/// Consume one map key, which must be an integer or a text string.
fn read_map_key(cursor: &mut ByteCursor) -> Result<MapKey> {
    let byte = cursor.read_u8("read map key head")?;
    let info = byte & 0x1f;
    match Major::from_u8(byte) {
        Major::Unsigned => Ok(MapKey::Int(Integer::from(read_argument(
            cursor,
            info,
            "decode map key",
        )?))),
        Major::Negative => {
            let n = read_argument(cursor, info, "decode map key")?;
            if n > i64::MAX as u64 {
                return Err(Error::MalformedEncoding(format!(
                    "Negative map key -1-{} exceeds representable range",
                    n
                )));
            }
            Ok(MapKey::Int(Integer::from(-1 - n as i64)))
        }
        Major::Text => Ok(MapKey::Text(read_text(cursor, info)?)),
        other => Err(Error::MalformedEncoding(format!(
            "Map keys must be integers or text, got {}",
            other.name()
        ))),
    }
}

fn read_text(cursor: &mut ByteCursor, info: u8) -> Result<String> {
    let len = read_length(cursor, info, "decode text length")?;
    let raw = cursor.read_bytes(len, "decode text")?;
    let text = std::str::from_utf8(raw)
        .map_err(|_| Error::MalformedEncoding("Text string wasn't valid UTF-8".to_string()))?;
    Ok(text.to_string())
}

/// Dispatch a tagged item through the recognized-tag table.
fn read_tagged(cursor: &mut ByteCursor, tag: u64, depth: usize) -> Result<Value> {
    match TagType::from_u64(tag) {
        Some(TagType::DateTime) => {
            let payload = read_value(cursor, depth + 1)?;
            let text = payload.as_str().ok_or_else(|| {
                Error::MalformedEncoding(format!(
                    "Date/time tag payload must be a text string, got {}",
                    payload.kind()
                ))
            })?;
            Ok(Value::Timestamp(Timestamp::from_rfc3339(text)?))
        }
        Some(TagType::EncodedCbor) => {
            // The payload byte string is captured, not decoded: its exact
            // bytes are what downstream digests are computed over.
            let byte = cursor.read_u8("read nested-CBOR head")?;
            let info = byte & 0x1f;
            if Major::from_u8(byte) != Major::Bytes {
                return Err(Error::MalformedEncoding(format!(
                    "Nested-CBOR tag payload must be a byte string, got {}",
                    Major::from_u8(byte).name()
                )));
            }
            let len = read_length(cursor, info, "decode nested-CBOR length")?;
            let raw = cursor.read_bytes(len, "decode nested-CBOR")?;
            Ok(Value::DataElement(DataElement::from_bytes(raw.to_vec())))
        }
        // Unrecognized tags pass their payload through untagged
        None => read_value(cursor, depth + 1),
    }
}

fn read_simple(cursor: &mut ByteCursor, info: u8) -> Result<Value> {
    Ok(match info {
        head::SIMPLE_FALSE => Value::Bool(false),
        head::SIMPLE_TRUE => Value::Bool(true),
        head::SIMPLE_NULL => Value::Null,
        head::SIMPLE_UNDEFINED => Value::Undefined,
        head::ARG_U8 => {
            let v = cursor.read_u8("decode simple value")?;
            return Err(Error::MalformedEncoding(format!(
                "Unsupported simple value {}",
                v
            )));
        }
        head::ARG_U16 => {
            let bits = cursor.read_u16("decode half-precision float")?;
            Value::F64(half_to_f64(bits))
        }
        head::ARG_U32 => {
            let bits = cursor.read_u32("decode single-precision float")?;
            Value::F64(f32::from_bits(bits) as f64)
        }
        head::ARG_U64 => {
            let bits = cursor.read_u64("decode double-precision float")?;
            Value::F64(f64::from_bits(bits))
        }
        head::ARG_INDEFINITE => {
            return Err(Error::MalformedEncoding(
                "Unexpected break byte outside an indefinite-length item".to_string(),
            ))
        }
        28..=30 => {
            return Err(Error::MalformedEncoding(format!(
                "Reserved additional-info value {}",
                info
            )))
        }
        v => {
            return Err(Error::MalformedEncoding(format!(
                "Unsupported simple value {}",
                v
            )))
        }
    })
}

/// Reconstruct an IEEE 754 half-precision value from its bit layout.
fn half_to_f64(half: u16) -> f64 {
    let exponent = (half >> 10) & 0x1f;
    let mantissa = (half & 0x3ff) as f64;
    let value = match exponent {
        0 => mantissa * 2f64.powi(-24),
        31 => {
            if mantissa == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (1024.0 + mantissa) * 2f64.powi(exponent as i32 - 25),
    };
    if half & 0x8000 != 0 {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::encode;

    fn decode_hex(s: &str) -> Result<Value> {
        decode(&hex::decode(s).unwrap())
    }

    fn roundtrip(value: Value) {
        let enc = encode(&value);
        let (back, used) = decode_prefix(&enc).unwrap();
        assert_eq!(back, value);
        assert_eq!(used, enc.len());
    }

    mod primitives {
        use super::*;

        #[test]
        fn roundtrip_integers() {
            for v in [0i64, 1, 10, 23, 24, 42, 255, 256, 65535, 65536, i64::MAX, -1, -24, -25, -256, -257, i64::MIN] {
                roundtrip(Value::from(v));
            }
            roundtrip(Value::from(u64::MAX));
        }

        #[test]
        fn roundtrip_floats() {
            for v in [0.0f64, 1.5, -1.0, 1.1, 1.0e300, f64::INFINITY] {
                roundtrip(Value::F64(v));
            }
        }

        #[test]
        fn roundtrip_text() {
            roundtrip(Value::from(""));
            roundtrip(Value::from("hello world"));
            roundtrip(Value::from("heiß"));
        }

        #[test]
        fn roundtrip_simple() {
            roundtrip(Value::Bool(true));
            roundtrip(Value::Bool(false));
            roundtrip(Value::Null);
            roundtrip(Value::Undefined);
        }

        #[test]
        fn roundtrip_bytes() {
            roundtrip(Value::Bytes(vec![]));
            roundtrip(Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        }
    }

    mod floats {
        use super::*;

        // RFC 8949 Appendix A half- and single-precision vectors
        #[test]
        fn short_widths_decode() {
            assert_eq!(decode_hex("f90000").unwrap(), Value::F64(0.0));
            assert_eq!(decode_hex("f93c00").unwrap(), Value::F64(1.0));
            assert_eq!(decode_hex("f93e00").unwrap(), Value::F64(1.5));
            assert_eq!(decode_hex("f9c400").unwrap(), Value::F64(-4.0));
            assert_eq!(decode_hex("f90001").unwrap(), Value::F64(5.960464477539063e-8));
            assert_eq!(decode_hex("f97c00").unwrap(), Value::F64(f64::INFINITY));
            assert_eq!(decode_hex("fa47c35000").unwrap(), Value::F64(100000.0));
            assert_eq!(decode_hex("fa7f7fffff").unwrap(), Value::F64(3.4028234663852886e38));
        }

        #[test]
        fn half_nan() {
            let v = decode_hex("f97e00").unwrap();
            assert!(v.as_f64().unwrap().is_nan());
        }
    }

    mod containers {
        use super::*;
        use crate::value::Map;

        #[test]
        fn roundtrip_arrays() {
            roundtrip(Value::Array(vec![]));
            roundtrip(Value::Array(vec![1.into(), 2.into(), 3.into()]));
            let nested: Vec<Value> = vec![
                Value::from(1),
                Value::Array(vec![2.into(), 3.into()]),
                Value::Array(vec![4.into(), 5.into()]),
            ];
            roundtrip(Value::Array(nested));
        }

        #[test]
        fn roundtrip_maps() {
            roundtrip(Value::Map(Map::new()));

            let mut map = Map::new();
            map.insert("a", 1);
            map.insert("b", "test");
            roundtrip(Value::Map(map));

            let mut map = Map::new();
            map.insert(1i64, "a");
            map.insert(2i64, "b");
            roundtrip(Value::Map(map));
        }

        #[test]
        fn undefined_keeps_key_presence() {
            let mut map = Map::new();
            map.insert("a", 1);
            map.insert("b", Value::Undefined);
            let decoded = decode(&encode(&Value::Map(map))).unwrap();
            let decoded = decoded.as_map().unwrap();
            assert_eq!(decoded.len(), 2);
            let keys: Vec<String> = decoded.keys().map(|k| k.to_string()).collect();
            assert_eq!(keys, vec!["a", "b"]);
            assert_eq!(decoded.get_text("b"), Some(&Value::Undefined));
        }

        #[test]
        fn mixed_key_kinds() {
            // {1: "a", "1": "b"} — integer and text keys coexist
            let decoded = decode_hex("a201616161316162").unwrap();
            let map = decoded.as_map().unwrap();
            assert_eq!(map.get_int(1).and_then(Value::as_str), Some("a"));
            assert_eq!(map.get_text("1").and_then(Value::as_str), Some("b"));
        }

        #[test]
        fn invalid_map_key_rejected() {
            // {[]: 1} — array keys are outside the supported key space
            assert!(matches!(
                decode_hex("a1800001"),
                Err(Error::MalformedEncoding(_))
            ));
        }
    }

    mod tags {
        use super::*;

        #[test]
        fn date_time() {
            let t = Timestamp::from_rfc3339("2020-10-01T13:30:02.923Z").unwrap();
            roundtrip(Value::Timestamp(t));
        }

        #[test]
        fn date_time_nested() {
            let t = Timestamp::from_rfc3339("1980-01-02T00:00:00.000Z").unwrap();
            let mut map = Map::new();
            map.insert(
                "issued",
                Value::Array(vec![Value::Null, Value::Timestamp(t)]),
            );
            roundtrip(Value::Map(map));
        }

        #[test]
        fn date_time_payload_must_be_text() {
            // 0(42)
            assert!(matches!(
                decode_hex("c0182a"),
                Err(Error::MalformedEncoding(_))
            ));
        }

        #[test]
        fn nested_cbor_is_not_recursed() {
            // 24(h'6449455446') wraps the encoding of "IETF"
            let v = decode_hex("d818456449455446").unwrap();
            let elem = v.as_data_element().unwrap();
            assert_eq!(elem.as_bytes(), &hex::decode("6449455446").unwrap()[..]);
            assert_eq!(elem.decode().unwrap(), Value::from("IETF"));
        }

        #[test]
        fn nested_cbor_payload_must_be_bytes() {
            // 24("IETF")
            assert!(matches!(
                decode_hex("d8186449455446"),
                Err(Error::MalformedEncoding(_))
            ));
        }

        #[test]
        fn unknown_tag_passes_payload_through() {
            // 32("http://example.com") — URI tag isn't recognized, text survives
            let v = decode_hex("d82072687474703a2f2f6578616d706c652e636f6d").unwrap();
            assert_eq!(v, Value::from("http://example.com"));
        }
    }

    mod malformed {
        use super::*;

        #[test]
        fn reserved_info_values() {
            for hexes in ["1c", "1d", "1e", "3c", "5c", "7c", "9c", "bc", "dc", "fc"] {
                assert!(
                    matches!(decode_hex(hexes), Err(Error::MalformedEncoding(_))),
                    "0x{} should be reserved",
                    hexes
                );
            }
        }

        #[test]
        fn indefinite_lengths_rejected() {
            for hexes in ["5f41004100ff", "7f6161ff", "9f01ff", "bf616101ff"] {
                assert!(
                    matches!(decode_hex(hexes), Err(Error::MalformedEncoding(_))),
                    "indefinite item 0x{} should be rejected",
                    hexes
                );
            }
        }

        #[test]
        fn stray_break_rejected() {
            assert!(matches!(decode_hex("ff"), Err(Error::MalformedEncoding(_))));
        }

        #[test]
        fn unassigned_simple_values_rejected() {
            assert!(matches!(decode_hex("f0"), Err(Error::MalformedEncoding(_))));
            assert!(matches!(decode_hex("f820"), Err(Error::MalformedEncoding(_))));
        }

        #[test]
        fn invalid_utf8_rejected() {
            assert!(matches!(decode_hex("61ff"), Err(Error::MalformedEncoding(_))));
        }

        #[test]
        fn huge_negative_rejected() {
            // -1 - u64::MAX is below i64::MIN
            assert!(matches!(
                decode_hex("3bffffffffffffffff"),
                Err(Error::MalformedEncoding(_))
            ));
        }
    }

    mod truncation {
        use super::*;

        #[test]
        fn empty_buffer() {
            assert!(matches!(decode(&[]), Err(Error::TruncatedInput { .. })));
        }

        #[test]
        fn every_prefix_fails_cleanly() {
            let mut map = Map::new();
            map.insert("a", Value::Array(vec![1.into(), Value::from("xyz")]));
            map.insert(2i64, Value::Bytes(vec![9, 9, 9]));
            let enc = encode(&Value::Map(map));
            for cut in 0..enc.len() {
                assert!(
                    decode(&enc[..cut]).is_err(),
                    "prefix of length {} should fail",
                    cut
                );
            }
            assert!(decode(&enc).is_ok());
        }

        #[test]
        fn truncated_argument() {
            assert!(matches!(decode(&[0x19, 0x01]), Err(Error::TruncatedInput { .. })));
            assert!(matches!(decode(&[0x5a]), Err(Error::TruncatedInput { .. })));
        }
    }

    mod framing {
        use super::*;

        #[test]
        fn trailing_bytes_are_not_an_error() {
            let (value, used) = decode_prefix(&[0x01, 0xde, 0xad]).unwrap();
            assert_eq!(value, Value::from(1));
            assert_eq!(used, 1);
        }

        #[test]
        fn depth_limit() {
            // MAX_DEPTH + 2 nested singleton arrays
            let mut buf = vec![0x81u8; MAX_DEPTH + 2];
            buf.push(0x01);
            assert!(matches!(decode(&buf), Err(Error::ParseLimit(_))));

            let mut buf = vec![0x81u8; MAX_DEPTH - 1];
            buf.push(0x01);
            assert!(decode(&buf).is_ok());
        }
    }
}
