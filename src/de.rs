//! Deserialization of serde types from [`Value`] trees and CBOR bytes.
//!
//! The inverse of [`ser`](crate::ser): a decoded `Value` tree acts as a serde
//! `Deserializer`. Timestamps surface as their RFC 3339 text and
//! `DataElement`s as their raw buffer bytes, so plain application types can
//! consume decoded documents without knowing about the extension variants.

use serde::de::{self, DeserializeOwned, Visitor};

use crate::error::{Error, Result};
use crate::integer::{get_int_internal, IntPriv};
use crate::value::{Map, MapKey, Value};

/// Deserialize a type out of a [`Value`] tree.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

/// Decode one CBOR item and deserialize a type from it.
pub fn from_slice<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    from_value(crate::decode::decode(buf)?)
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null | Value::Undefined => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) => match get_int_internal(&v) {
                IntPriv::PosInt(n) => visitor.visit_u64(n),
                IntPriv::NegInt(n) => visitor.visit_i64(n),
            },
            Value::F64(v) => visitor.visit_f64(v),
            Value::Bytes(v) => visitor.visit_byte_buf(v),
            Value::Text(v) => visitor.visit_string(v),
            Value::Array(v) => visit_array(v, visitor),
            Value::Map(m) => visit_map(m, visitor),
            Value::Timestamp(t) => visitor.visit_string(t.to_rfc3339()),
            Value::DataElement(d) => visitor.visit_byte_buf(d.into_bytes()),
            Value::Tagged(_, v) => v.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null | Value::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            Value::Text(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) if map.len() == 1 => {
                let (key, value) = map.into_iter().next().expect("len checked");
                let variant = match key {
                    MapKey::Text(s) => s,
                    MapKey::Int(n) => {
                        return Err(Error::SerdeFail(format!(
                            "expected an enum variant name, found integer key {}",
                            n
                        )))
                    }
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(Error::SerdeFail(format!(
                "cannot deserialize {} into an enum",
                other.kind()
            ))),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

fn visit_array<'de, V: Visitor<'de>>(array: Vec<Value>, visitor: V) -> Result<V::Value> {
    visitor.visit_seq(SeqDeserializer {
        iter: array.into_iter(),
    })
}

fn visit_map<'de, V: Visitor<'de>>(map: Map, visitor: V) -> Result<V::Value> {
    visitor.visit_map(MapDeserializer {
        iter: map.into_iter(),
        value: None,
    })
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(MapKey, Value)>,
    value: Option<Value>,
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key = match key {
                    MapKey::Int(n) => Value::Int(n),
                    MapKey::Text(s) => Value::Text(s),
                };
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .value
            .take()
            .expect("next_value_seed called before next_key_seed");
        seed.deserialize(value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantDeserializer)> {
        let variant = seed.deserialize(Value::Text(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(v) => Err(Error::SerdeFail(format!(
                "unexpected {} payload on a unit variant",
                v.kind()
            ))),
        }
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        match self.value {
            Some(v) => seed.deserialize(v),
            None => Err(Error::SerdeFail(
                "expected a payload for a newtype variant".to_string(),
            )),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(Value::Array(v)) => visit_array(v, visitor),
            Some(v) => Err(Error::SerdeFail(format!(
                "expected an array payload for a tuple variant, found {}",
                v.kind()
            ))),
            None => Err(Error::SerdeFail(
                "expected a payload for a tuple variant".to_string(),
            )),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Some(Value::Map(m)) => visit_map(m, visitor),
            Some(v) => Err(Error::SerdeFail(format!(
                "expected a map payload for a struct variant, found {}",
                v.kind()
            ))),
            None => Err(Error::SerdeFail(
                "expected a payload for a struct variant".to_string(),
            )),
        }
    }
}
