//! CBOR encoding of [`Value`] trees.
//!
//! Encoding is plain structural recursion: every head uses the smallest
//! argument width that holds its value, floats are always written as 64-bit
//! doubles, and maps are written in their insertion order. There is no cycle
//! detection — a `Value` is a tree by construction.

use crate::head::{self, Major, TagType};
use crate::integer::{get_int_internal, IntPriv};
use crate::value::{Map, MapKey, Value};

/// Encode a value into a fresh byte vector.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf);
    buf
}

/// Encode a value onto the end of an existing byte vector.
pub fn encode_into(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Null => buf.push(Major::Simple.into_u8() | head::SIMPLE_NULL),
        Value::Undefined => buf.push(Major::Simple.into_u8() | head::SIMPLE_UNDEFINED),
        Value::Bool(v) => buf.push(
            Major::Simple.into_u8() | if *v { head::SIMPLE_TRUE } else { head::SIMPLE_FALSE },
        ),
        Value::Int(v) => match get_int_internal(v) {
            IntPriv::PosInt(n) => head::write_head(buf, Major::Unsigned, n),
            // Major type 1 carries -1 - n; in two's complement that is !n
            IntPriv::NegInt(n) => head::write_head(buf, Major::Negative, !(n as u64)),
        },
        Value::F64(v) => {
            buf.push(Major::Simple.into_u8() | head::ARG_U64);
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
        Value::Bytes(v) => {
            head::write_head(buf, Major::Bytes, v.len() as u64);
            buf.extend_from_slice(v);
        }
        Value::Text(v) => {
            head::write_head(buf, Major::Text, v.len() as u64);
            buf.extend_from_slice(v.as_bytes());
        }
        Value::Array(v) => {
            head::write_head(buf, Major::Array, v.len() as u64);
            for item in v {
                encode_into(item, buf);
            }
        }
        Value::Map(v) => encode_map(v, buf),
        Value::Timestamp(v) => {
            head::write_head(buf, Major::Tag, TagType::DateTime.into_u64());
            let text = v.to_rfc3339();
            head::write_head(buf, Major::Text, text.len() as u64);
            buf.extend_from_slice(text.as_bytes());
        }
        Value::DataElement(v) => {
            head::write_head(buf, Major::Tag, TagType::EncodedCbor.into_u64());
            head::write_head(buf, Major::Bytes, v.as_bytes().len() as u64);
            buf.extend_from_slice(v.as_bytes());
        }
        Value::Tagged(tag, v) => {
            head::write_head(buf, Major::Tag, *tag);
            encode_into(v, buf);
        }
    }
}

fn encode_map(map: &Map, buf: &mut Vec<u8>) {
    head::write_head(buf, Major::Map, map.len() as u64);
    for (key, value) in map.iter() {
        match key {
            MapKey::Int(n) => match get_int_internal(n) {
                IntPriv::PosInt(n) => head::write_head(buf, Major::Unsigned, n),
                IntPriv::NegInt(n) => head::write_head(buf, Major::Negative, !(n as u64)),
            },
            MapKey::Text(s) => {
                head::write_head(buf, Major::Text, s.len() as u64);
                buf.extend_from_slice(s.as_bytes());
            }
        }
        // Undefined values are written out like any other; a key is never
        // dropped because its value is the undefined simple value
        encode_into(value, buf);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_element::DataElement;
    use crate::timestamp::Timestamp;

    fn assert_encodes(value: impl Into<Value>, expected_hex: &str) {
        let value = value.into();
        assert_eq!(
            hex::encode(encode(&value)),
            expected_hex,
            "encoding {:?}",
            value
        );
    }

    mod integers {
        use super::*;

        // Known-answer vectors from RFC 8949 Appendix A
        #[test]
        fn spec() {
            assert_encodes(0, "00");
            assert_encodes(1, "01");
            assert_encodes(10, "0a");
            assert_encodes(23, "17");
            assert_encodes(24, "1818");
            assert_encodes(25, "1819");
            assert_encodes(100, "1864");
            assert_encodes(1000, "1903e8");
            assert_encodes(1000000, "1a000f4240");
            assert_encodes(1000000000000u64, "1b000000e8d4a51000");
            assert_encodes(u64::MAX, "1bffffffffffffffff");
            assert_encodes(-1, "20");
            assert_encodes(-10, "29");
            assert_encodes(-100, "3863");
            assert_encodes(-1000, "3903e7");
            assert_encodes(i64::MIN, "3b7fffffffffffffff");
        }
    }

    mod floats {
        use super::*;

        // Floats always encode at double width
        #[test]
        fn spec() {
            assert_encodes(1.5, "fb3ff8000000000000");
            assert_encodes(-1.0, "fbbff0000000000000");
            assert_encodes(1.1, "fb3ff199999999999a");
            assert_encodes(0.0, "fb0000000000000000");
            assert_encodes(f64::INFINITY, "fb7ff0000000000000");
        }

        #[test]
        fn bit_exact() {
            for v in [1.5f64, -1.0, 1.1, 1.0e300, 5.960464477539063e-8] {
                let enc = encode(&Value::F64(v));
                assert_eq!(enc[0], 0xfb);
                assert_eq!(u64::from_be_bytes(enc[1..9].try_into().unwrap()), v.to_bits());
            }
        }
    }

    mod strings {
        use super::*;

        #[test]
        fn spec() {
            assert_encodes("", "60");
            assert_encodes("a", "6161");
            assert_encodes("IETF", "6449455446");
            assert_encodes("hello world", "6b68656c6c6f20776f726c64");
            assert_encodes(Value::Bytes(vec![]), "40");
            assert_encodes(Value::Bytes(vec![1, 2, 3, 4]), "4401020304");
        }

        #[test]
        fn long_text_length_prefix() {
            let s = "x".repeat(500);
            let enc = encode(&Value::from(s.as_str()));
            assert_eq!(&enc[..3], &[0x79, 0x01, 0xf4]);
            assert_eq!(enc.len(), 503);
        }
    }

    mod simple {
        use super::*;

        #[test]
        fn spec() {
            assert_encodes(false, "f4");
            assert_encodes(true, "f5");
            assert_encodes(Value::Null, "f6");
            assert_encodes(Value::Undefined, "f7");
        }
    }

    mod containers {
        use super::*;

        #[test]
        fn spec() {
            assert_encodes(Value::Array(vec![]), "80");
            assert_encodes(
                Value::Array(vec![1.into(), 2.into(), 3.into()]),
                "83010203",
            );
            assert_encodes(Value::Map(Map::new()), "a0");

            let mut map = Map::new();
            map.insert(1i64, 2);
            map.insert(3i64, 4);
            assert_encodes(map, "a201020304");

            let mut map = Map::new();
            map.insert("a", 1);
            map.insert("b", Value::Array(vec![2.into(), 3.into()]));
            assert_encodes(map, "a26161016162820203");
        }

        #[test]
        fn map_order_is_insertion_order() {
            let mut map = Map::new();
            map.insert("b", 2);
            map.insert("a", 1);
            // "b" first: no canonical re-sorting
            assert_encodes(map, "a2616202616101");
        }

        #[test]
        fn undefined_map_values_are_written() {
            let mut map = Map::new();
            map.insert("a", 1);
            map.insert("b", Value::Undefined);
            assert_encodes(map, "a26161016162f7");
        }
    }

    mod tags {
        use super::*;

        #[test]
        fn timestamp() {
            let t = Timestamp::from_rfc3339("2020-10-01T13:30:02.923Z").unwrap();
            let enc = encode(&Value::Timestamp(t));
            // c0 = tag 0, 78 18 = text of length 24
            assert_eq!(enc[0], 0xc0);
            assert_eq!(&enc[1..3], &[0x78, 0x18]);
            assert_eq!(&enc[3..], "2020-10-01T13:30:02.923Z".as_bytes());
        }

        #[test]
        fn data_element_bytes_verbatim() {
            let elem = DataElement::from_bytes(vec![0x83, 0x01, 0x02, 0x03]);
            assert_encodes(Value::DataElement(elem), "d8184483010203");
        }

        #[test]
        fn arbitrary_tag() {
            let v = Value::Tagged(32, Box::new(Value::from("http://example.com")));
            assert_encodes(v, "d82072687474703a2f2f6578616d706c652e636f6d");
        }
    }
}
