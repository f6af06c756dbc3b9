use std::borrow::Cow;
use std::fmt;
use std::ops::Index;

use crate::data_element::DataElement;
use crate::integer::Integer;
use crate::timestamp::Timestamp;

/// A decoded CBOR item.
///
/// This is the closed set of shapes the codec produces and consumes. `Null`
/// and `Undefined` are distinct states and both survive a round trip; a map
/// entry whose value is `Undefined` keeps its key. `Tagged` carries tags the
/// codec assigns no meaning to — on encode the tag is written, but see
/// [`decode`](crate::decode) for the one-way behavior on the way back in.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(Integer),
    F64(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Map),
    Timestamp(Timestamp),
    DataElement(DataElement),
    Tagged(u64, Box<Value>),
}

impl Value {
    /// Name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        use self::Value::*;
        match self {
            Null => "null",
            Undefined => "undefined",
            Bool(_) => "bool",
            Int(_) => "integer",
            F64(_) => "float",
            Bytes(_) => "bytes",
            Text(_) => "text",
            Array(_) => "array",
            Map(_) => "map",
            Timestamp(_) => "timestamp",
            DataElement(_) => "data element",
            Tagged(..) => "tagged",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, Value::F64(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    pub fn is_data_element(&self) -> bool {
        matches!(self, Value::DataElement(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_int(&self) -> Option<Integer> {
        if let Value::Int(val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(ref n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(ref n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Text(ref val) = *self {
            Some(val.as_str())
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(ref val) = *self {
            Some(val)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(ref array) = *self {
            Some(array)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match *self {
            Value::Array(ref mut array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        if let Value::Map(ref map) = *self {
            Some(map)
        } else {
            None
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match *self {
            Value::Map(ref mut map) => Some(map),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        if let Value::Timestamp(time) = *self {
            Some(time)
        } else {
            None
        }
    }

    pub fn as_data_element(&self) -> Option<&DataElement> {
        if let Value::DataElement(ref elem) = *self {
            Some(elem)
        } else {
            None
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

static NULL: Value = Value::Null;

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_array().and_then(|v| v.get(index)).unwrap_or(&NULL)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, index: &str) -> &Self::Output {
        self.as_map().and_then(|m| m.get_text(index)).unwrap_or(&NULL)
    }
}

macro_rules! impl_value_from_integer {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(From::from(v))
            }
        }
    };
}

macro_rules! impl_value_from {
    ($t: ty, $p: ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$p(v)
            }
        }
    };
}

impl_value_from!(bool, Bool);
impl_value_from!(Integer, Int);
impl_value_from!(f64, F64);
impl_value_from!(String, Text);
impl_value_from!(Vec<u8>, Bytes);
impl_value_from!(Vec<Value>, Array);
impl_value_from!(Map, Map);
impl_value_from!(Timestamp, Timestamp);
impl_value_from!(DataElement, DataElement);
impl_value_from_integer!(u8);
impl_value_from_integer!(u16);
impl_value_from_integer!(u32);
impl_value_from_integer!(u64);
impl_value_from_integer!(usize);
impl_value_from_integer!(i8);
impl_value_from_integer!(i16);
impl_value_from_integer!(i32);
impl_value_from_integer!(i64);
impl_value_from_integer!(isize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(v as f64)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(v: Cow<'a, str>) -> Self {
        Value::Text(v.to_string())
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.into())
    }
}

impl<V: Into<Value>> std::iter::FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let v: Vec<Value> = iter.into_iter().map(Into::into).collect();
        Value::Array(v)
    }
}

/// A CBOR map key: an integer or a text string.
///
/// This is the full key space observed in mdoc documents — COSE header labels
/// and digest IDs are integers, element identifiers are text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Int(Integer),
    Text(String),
}

impl MapKey {
    pub fn as_int(&self) -> Option<Integer> {
        if let MapKey::Int(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let MapKey::Text(ref v) = *self {
            Some(v.as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MapKey::Int(v) => fmt::Display::fmt(v, f),
            MapKey::Text(v) => f.write_str(v),
        }
    }
}

impl From<Integer> for MapKey {
    fn from(v: Integer) -> Self {
        MapKey::Int(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        MapKey::Int(v.into())
    }
}

impl From<u64> for MapKey {
    fn from(v: u64) -> Self {
        MapKey::Int(v.into())
    }
}

impl From<i32> for MapKey {
    fn from(v: i32) -> Self {
        MapKey::Int(v.into())
    }
}

impl From<String> for MapKey {
    fn from(v: String) -> Self {
        MapKey::Text(v)
    }
}

impl<'a> From<&'a str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::Text(v.to_string())
    }
}

/// An insertion-ordered CBOR map.
///
/// Every CBOR map decodes into this one container type regardless of what
/// produced it; only the (key, value) entries carry over. Entries keep their
/// encounter order and the encoder writes them back in that order — no
/// canonical re-sorting is ever performed, so decode→encode leaves map bytes
/// untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    entries: Vec<(MapKey, Value)>,
}

impl Map {
    pub fn new() -> Map {
        Map {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Map {
        Map {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry. An existing entry with the same key is replaced in
    /// place, keeping its original position; a new key appends.
    pub fn insert(&mut self, key: impl Into<MapKey>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        for (k, v) in self.entries.iter_mut() {
            if *k == key {
                return Some(std::mem::replace(v, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_text(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn get_int(&self, key: i64) -> Option<&Value> {
        let key = Integer::from(key);
        self.entries
            .iter()
            .find(|(k, _)| k.as_int() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &MapKey) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (MapKey, Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl IntoIterator for Map {
    type Item = (MapKey, Value);
    type IntoIter = std::vec::IntoIter<(MapKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = &'a (MapKey, Value);
    type IntoIter = std::slice::Iter<'a, (MapKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<MapKey>, V: Into<Value>> std::iter::FromIterator<(K, V)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for MapKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MapKey::Int(v) => v.serialize(serializer),
            MapKey::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => v.serialize(serializer),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Bytes(v) => serializer.serialize_bytes(v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Array(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for item in v {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(v) => {
                let mut map = serializer.serialize_map(Some(v.len()))?;
                for (key, value) in v.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Timestamp(v) => v.serialize(serializer),
            Value::DataElement(v) => v.serialize(serializer),
            Value::Tagged(_, v) => v.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_missing_is_null() {
        let value: Value = vec![1u8, 2, 3].into_iter().collect();
        assert_eq!(value[0], Value::from(1u8));
        assert_eq!(value[7], Value::Null);
        assert_eq!(value["nope"], Value::Null);
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut map = Map::new();
        map.insert("zebra", 1);
        map.insert(0i64, 2);
        map.insert("apple", 3);
        let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["zebra", "0", "apple"]);
    }

    #[test]
    fn map_insert_replaces_in_place() {
        let mut map = Map::new();
        map.insert("a", 1);
        map.insert("b", 2);
        let old = map.insert("a", 10);
        assert_eq!(old, Some(Value::from(1)));
        assert_eq!(map.len(), 2);
        let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get_text("a"), Some(&Value::from(10)));
    }

    #[test]
    fn int_and_text_keys_are_distinct() {
        let mut map = Map::new();
        map.insert(1i64, "int key");
        map.insert("1", "text key");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_int(1).and_then(Value::as_str), Some("int key"));
        assert_eq!(map.get_text("1").and_then(Value::as_str), Some("text key"));
    }

    #[test]
    fn undefined_is_not_null() {
        assert_ne!(Value::Undefined, Value::Null);
        assert!(Value::Undefined.is_undefined());
        assert!(!Value::Undefined.is_null());
    }
}
