use std::convert::TryFrom;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Structure for holding a CBOR date/time value (tag 0).
///
/// Stores a UTC instant at millisecond precision; the extra precision an RFC
/// 3339 source string may carry is truncated on construction so that a decoded
/// timestamp always re-encodes to the same text form it would have produced
/// itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Create a timestamp from any chrono UTC instant, truncating to
    /// millisecond precision.
    pub fn from_datetime(instant: DateTime<Utc>) -> Timestamp {
        let millis = instant.timestamp_millis();
        Timestamp {
            instant: DateTime::from_timestamp_millis(millis).unwrap_or(instant),
        }
    }

    /// Create a timestamp from milliseconds since the UNIX epoch. Returns
    /// `None` for instants chrono cannot represent.
    pub fn from_millis(millis: i64) -> Option<Timestamp> {
        DateTime::from_timestamp_millis(millis).map(|instant| Timestamp { instant })
    }

    /// Parse an RFC 3339 date/time string. Offsets other than `Z` are accepted
    /// and normalized to UTC.
    pub fn from_rfc3339(s: &str) -> Result<Timestamp> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::MalformedEncoding(format!("Invalid RFC 3339 date/time: {}", e)))?;
        Ok(Timestamp::from_datetime(parsed.with_timezone(&Utc)))
    }

    /// The current time, truncated to millisecond precision.
    pub fn now() -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }

    /// Milliseconds since the UNIX epoch.
    pub fn as_millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }

    /// The RFC 3339 text form written into the CBOR encoding, always with
    /// millisecond precision and a `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.instant.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Timestamp {
        Timestamp::from_datetime(instant)
    }
}

impl TryFrom<&str> for Timestamp {
    type Error = Error;
    fn try_from(s: &str) -> Result<Timestamp> {
        Timestamp::from_rfc3339(s)
    }
}

use serde::{
    de::{Deserialize, Deserializer, Visitor},
    ser::{Serialize, Serializer},
};

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimeVisitor;
        impl<'de> Visitor<'de> for TimeVisitor {
            type Value = Timestamp;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt.write_str("an RFC 3339 date/time string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Timestamp::from_rfc3339(v).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(TimeVisitor)
    }
}
