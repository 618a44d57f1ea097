//! Cursor codec.
//!
//! A cursor is the creation instant of a row, rendered on the wire as the
//! number of milliseconds since the Unix epoch (UTC) in base 10. Tokens
//! already handed to clients must stay decodable, so the format never
//! changes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PaginationError, PaginationResult};

/// Opaque position in a time-ordered collection.
///
/// The wrapped timestamp is always truncated to millisecond precision so
/// that `decode(encode(c)) == c` holds for every cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    /// Build a cursor from a sort key, dropping sub-millisecond precision.
    pub fn from_timestamp(sort_key: DateTime<Utc>) -> Self {
        let millis = sort_key.timestamp_millis();
        // Any DateTime<Utc> truncated to millis is itself representable.
        Self(DateTime::from_timestamp_millis(millis).unwrap_or(sort_key))
    }

    /// Build a cursor from raw epoch milliseconds.
    ///
    /// Returns `None` when the value is outside chrono's supported range.
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// The sort key this cursor points at.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Epoch milliseconds of the sort key.
    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Render the wire token.
    pub fn encode(&self) -> String {
        self.millis().to_string()
    }

    /// Decode an optional wire token.
    ///
    /// An absent or empty token means "no bound": the window starts at the
    /// open end of the collection. Anything else must be a well-formed
    /// encoding or the call fails with [`PaginationError::InvalidCursor`].
    pub fn decode(token: Option<&str>) -> PaginationResult<Option<Self>> {
        match token {
            None | Some("") => Ok(None),
            Some(token) => token.parse().map(Some),
        }
    }
}

impl FromStr for Cursor {
    type Err = PaginationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let millis: i64 = token
            .parse()
            .map_err(|_| PaginationError::InvalidCursor(format!("'{}' is not a number", token)))?;

        // Only the canonical rendering is accepted: no sign, no padding.
        if millis.to_string() != token {
            return Err(PaginationError::InvalidCursor(format!(
                "'{}' is not a canonical timestamp",
                token
            )));
        }

        Self::from_millis(millis).ok_or_else(|| {
            PaginationError::InvalidCursor(format!("'{}' is out of the timestamp range", token))
        })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.millis())
    }
}

impl From<DateTime<Utc>> for Cursor {
    fn from(sort_key: DateTime<Utc>) -> Self {
        Self::from_timestamp(sort_key)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
