//! Serialization of arbitrary serde types into [`Value`] trees and CBOR bytes.
//!
//! The byte-faithful path through the codec is always `Value`-based; this
//! bridge exists so application types can be dropped into payloads and
//! `DataElement`s without hand-building `Value` trees. Kinds with no CBOR
//! encoding rule (out-of-range 128-bit integers, non-integer non-text map
//! keys) fail with [`Error::UnsupportedType`].

use serde::ser::{self, Serialize};

use crate::encode::encode;
use crate::error::{Error, Result};
use crate::value::{Map, MapKey, Value};

/// Serialize a value into a [`Value`] tree.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Serialize a value straight to CBOR bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(encode(&to_value(value)?))
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        if v >= 0 {
            u64::try_from(v)
                .map(Value::from)
                .map_err(|_| Error::UnsupportedType("i128 above u64::MAX".to_string()))
        } else {
            i64::try_from(v)
                .map(Value::from)
                .map_err(|_| Error::UnsupportedType("i128 below i64::MIN".to_string()))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        u64::try_from(v)
            .map(Value::from)
            .map_err(|_| Error::UnsupportedType("u128 above u64::MAX".to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::F64(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(variant, value.serialize(ValueSerializer)?);
        Ok(Value::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeMap {
            map: Map::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(SerializeStruct {
            map: Map::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            map: Map::with_capacity(len),
        })
    }
}

/// Serializer for map keys, which CBOR maps restrict to integers and text.
struct MapKeySerializer;

impl MapKeySerializer {
    fn unsupported(kind: &str) -> Error {
        Error::UnsupportedType(format!("map key of kind {}", kind))
    }
}

impl ser::Serializer for MapKeySerializer {
    type Ok = MapKey;
    type Error = Error;

    type SerializeSeq = ser::Impossible<MapKey, Error>;
    type SerializeTuple = ser::Impossible<MapKey, Error>;
    type SerializeTupleStruct = ser::Impossible<MapKey, Error>;
    type SerializeTupleVariant = ser::Impossible<MapKey, Error>;
    type SerializeMap = ser::Impossible<MapKey, Error>;
    type SerializeStruct = ser::Impossible<MapKey, Error>;
    type SerializeStructVariant = ser::Impossible<MapKey, Error>;

    fn serialize_bool(self, _v: bool) -> Result<MapKey> {
        Err(Self::unsupported("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u8(self, v: u8) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<MapKey> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_f32(self, _v: f32) -> Result<MapKey> {
        Err(Self::unsupported("float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<MapKey> {
        Err(Self::unsupported("float"))
    }

    fn serialize_char(self, v: char) -> Result<MapKey> {
        Ok(MapKey::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<MapKey> {
        Ok(MapKey::Text(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<MapKey> {
        Err(Self::unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<MapKey> {
        Err(Self::unsupported("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<MapKey> {
        Err(Self::unsupported("option"))
    }

    fn serialize_unit(self) -> Result<MapKey> {
        Err(Self::unsupported("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<MapKey> {
        Err(Self::unsupported("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<MapKey> {
        Ok(MapKey::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<MapKey> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<MapKey> {
        Err(Self::unsupported("newtype variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Self::unsupported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Self::unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Self::unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Self::unsupported("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Self::unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Self::unsupported("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Self::unsupported("struct variant"))
    }
}

pub struct SerializeVec {
    vec: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.vec.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    vec: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.vec.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant, Value::Array(self.vec));
        Ok(Value::Map(map))
    }
}

pub struct SerializeMap {
    map: Map,
    next_key: Option<MapKey>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        // Panic on a missing key is serde's documented contract for misuse
        let key = self.next_key.take().expect("serialize_value before serialize_key");
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.map))
    }
}

pub struct SerializeStruct {
    map: Map,
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.map))
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    map: Map,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant, Value::Map(self.map));
        Ok(Value::Map(map))
    }
}
