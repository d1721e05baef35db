// Serialization layer - compact JSON encoding of changesets
//!
//! Strips use the smallest JSON shape that identifies them:
//!
//! | Strip                 | JSON       |
//! |-----------------------|------------|
//! | `Insert("abc")`       | `"abc"`    |
//! | `Retain(4, 4)`        | `4`        |
//! | `Retain(2, 7)`        | `[2, 7]`   |
//! | `Empty`               | `null`     |
//!
//! A changeset is the array of its strips. Lengths are not sent; they are
//! recomputed from the strips when decoding.

use super::messages::{ClientMessage, ServerMessage};
use crate::changeset::{Changeset, Strip, Strips};
use crate::error::{Result, SyncError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Any strip shape accepted on the wire
#[derive(Deserialize)]
#[serde(untagged)]
enum WireStrip {
    Index(usize),
    Range(usize, usize),
    Text(String),
    Empty(()),
}

impl WireStrip {
    fn into_strip(self) -> std::result::Result<Strip, String> {
        match self {
            WireStrip::Index(index) => Ok(Strip::retain(index, index)),
            WireStrip::Range(start, end) if end < start => {
                Err(format!("reversed retain [{}, {}]", start, end))
            }
            WireStrip::Range(start, end) => Ok(Strip::retain(start, end)),
            WireStrip::Text(value) => Ok(Strip::insert(value)),
            WireStrip::Empty(()) => Ok(Strip::Empty),
        }
    }
}

impl Serialize for Strip {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Strip::Retain { start, end } if start == end => serializer.serialize_u64(*start as u64),
            Strip::Retain { start, end } => (start, end).serialize(serializer),
            Strip::Insert(value) => serializer.serialize_str(value),
            Strip::Empty => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Strip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        WireStrip::deserialize(deserializer)?
            .into_strip()
            .map_err(D::Error::custom)
    }
}

impl Serialize for Strips {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Strips {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Strips::from(Vec::<Strip>::deserialize(deserializer)?))
    }
}

impl Serialize for Changeset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.strips().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Changeset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let strips = Strips::deserialize(deserializer)?;
        strips.validate().map_err(D::Error::custom)?;
        Ok(Changeset::new(strips))
    }
}

/// Encode a changeset as a JSON array of strips
pub fn serialize_changeset(changeset: &Changeset) -> Result<String> {
    Ok(serde_json::to_string(changeset)?)
}

/// Decode a changeset, recomputing its lengths
///
/// # Errors
///
/// Returns `SyncError::InvalidChangeset` for reversed or out-of-order
/// retains and `SyncError::Json` for malformed JSON.
pub fn deserialize_changeset(json: &str) -> Result<Changeset> {
    let strips: Strips = serde_json::from_str(json).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => SyncError::InvalidChangeset(e.to_string()),
        _ => SyncError::Json(e),
    })?;
    strips.validate()?;
    Ok(Changeset::new(strips))
}

/// Encode any protocol message
pub fn encode_message<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode_client_message(json: &str) -> Result<ClientMessage> {
    Ok(serde_json::from_str(json)?)
}

pub fn decode_server_message(json: &str) -> Result<ServerMessage> {
    Ok(serde_json::from_str(json)?)
}
