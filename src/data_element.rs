use std::fmt;

use crate::error::Result;
use crate::value::Value;

/// An opaque, independently encoded CBOR item (tag 24).
///
/// ISO 18013-5 computes digests over the exact bytes of each issuer-signed
/// item, so those bytes must survive any number of decode/encode cycles
/// untouched. A `DataElement` holds them verbatim: the encoder writes the
/// stored buffer unchanged behind the nested-CBOR tag, and the decoder
/// captures the tag's byte-string payload without ever recursing into it.
/// Reading the wrapped value back out is an explicit, separate step
/// ([`DataElement::decode`]).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataElement {
    bytes: Vec<u8>,
}

impl DataElement {
    /// Wrap a value by CBOR-encoding it once. The resulting bytes are what
    /// digests get computed over.
    pub fn from_value(value: &Value) -> DataElement {
        DataElement {
            bytes: crate::encode::encode(value),
        }
    }

    /// Wrap any serializable value by bridging it through [`Value`] and
    /// encoding once.
    pub fn from_data<T: serde::Serialize>(data: &T) -> Result<DataElement> {
        Ok(DataElement::from_value(&crate::ser::to_value(data)?))
    }

    /// Wrap bytes that are already a complete CBOR item. The buffer is stored
    /// as-is and is never validated here; a bad buffer surfaces when
    /// [`decode`](Self::decode) is called on it.
    pub fn from_bytes(bytes: Vec<u8>) -> DataElement {
        DataElement { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the wrapped item. This is the only way the buffer's contents are
    /// ever interpreted.
    pub fn decode(&self) -> Result<Value> {
        crate::decode::decode(&self.bytes)
    }
}

impl fmt::Debug for DataElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DataElement(h'")?;
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "')")
    }
}

use serde::ser::{Serialize, Serializer};
use serde_bytes::Bytes;

impl Serialize for DataElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Bytes::new(&self.bytes).serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Map;

    #[test]
    fn from_value_stores_encoding() {
        let elem = DataElement::from_value(&Value::from("hello"));
        assert_eq!(elem.as_bytes(), &[0x65, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(elem.decode().unwrap(), Value::from("hello"));
    }

    #[test]
    fn buffer_is_not_eagerly_interpreted() {
        // Truncated CBOR is accepted at construction and only fails on decode
        let elem = DataElement::from_bytes(vec![0x65, b'h', b'i']);
        assert_eq!(elem.len(), 3);
        assert!(elem.decode().is_err());
    }

    #[test]
    fn from_data_bridges_serde() {
        let mut expected = Map::new();
        expected.insert("a", 1u64);
        #[derive(serde::Serialize)]
        struct Item {
            a: u64,
        }
        let elem = DataElement::from_data(&Item { a: 1 }).unwrap();
        assert_eq!(elem.decode().unwrap(), Value::Map(expected));
    }
}
