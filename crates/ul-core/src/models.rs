//! # Domain Models
//!
//! A `ProfileRecord` is what the upstream API sends for one person.
//! A `Profile` is that record plus a locally generated surrogate id.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::date;
use crate::error::{DecodeError, DecodeResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Name {
    pub title: String,
    pub first: String,
    pub last: String,
}

/// Image URLs, kept as given (not validated).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Picture {
    pub large: String,
    pub medium: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Birth {
    pub date: DateTime<Utc>,
    pub age: u32,
}

impl Birth {
    /// Decodes a single `{"date": ..., "age": ...}` object.
    pub fn from_json(raw: &str) -> DecodeResult<Self> {
        let wire: WireBirth = serde_json::from_str(raw)?;
        Birth::try_from(wire)
    }

    pub fn formatted_date(&self) -> String {
        date::format_iso_date(&self.date)
    }

    pub fn medium_date(&self) -> String {
        date::format_medium_date(&self.date)
    }
}

/// One decoded server record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub name: Name,
    pub dob: Birth,
    pub picture: Picture,
}

/// A displayed person.
///
/// `id` is regenerated on every construction, so equality ignores it and
/// compares the payload fields only.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub name: Name,
    pub dob: Birth,
    pub picture: Picture,
}

impl Profile {
    pub fn from_record(record: ProfileRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: record.name,
            dob: record.dob,
            picture: record.picture,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first, self.name.last)
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.dob == other.dob && self.picture == other.picture
    }
}

impl Eq for Profile {}

// Wire shapes: dates stay strings until the whole record has been read.

#[derive(Deserialize)]
struct WireBirth {
    date: String,
    age: u32,
}

#[derive(Deserialize)]
struct WireRecord {
    name: Name,
    dob: WireBirth,
    picture: Picture,
}

#[derive(Deserialize)]
struct WireEnvelope {
    results: Vec<WireRecord>,
}

impl TryFrom<WireBirth> for Birth {
    type Error = DecodeError;

    fn try_from(wire: WireBirth) -> DecodeResult<Self> {
        Ok(Birth {
            date: date::parse_timestamp(&wire.date)?,
            age: wire.age,
        })
    }
}

impl TryFrom<WireRecord> for ProfileRecord {
    type Error = DecodeError;

    fn try_from(wire: WireRecord) -> DecodeResult<Self> {
        Ok(ProfileRecord {
            name: wire.name,
            dob: Birth::try_from(wire.dob)?,
            picture: wire.picture,
        })
    }
}

/// Decodes a `{"results": [...]}` response body.
///
/// A single bad record fails the whole batch.
pub fn decode_envelope(body: &[u8]) -> DecodeResult<Vec<ProfileRecord>> {
    let envelope: WireEnvelope = serde_json::from_slice(body)?;
    envelope
        .results
        .into_iter()
        .map(ProfileRecord::try_from)
        .collect()
}
