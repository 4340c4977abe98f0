//! Incident data structure.

use chrono::NaiveDateTime;

/// Timestamp layouts the feed has been observed to publish.
const TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// One active-call record observed in the feed.
///
/// The identifier is the dedup key and stays opaque text even when it looks
/// numeric. Every descriptive field is optional: a missing field degrades
/// message formatting but never drops the record before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    /// Stable identifier assigned by the dispatch system
    pub id: String,

    /// Raw timestamp text as published
    pub time: Option<String>,

    /// Call type description
    pub call_type: Option<String>,

    /// Street address or intersection text
    pub location: Option<String>,

    /// Police district
    pub district: Option<String>,

    /// Dispatch status
    pub status: Option<String>,
}

impl Incident {
    /// Best-effort parse of the published timestamp.
    ///
    /// Returns `None` when the field is absent or in a layout the feed has
    /// not used before; callers fall back to the raw text.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let raw = self.time.as_deref()?.trim();
        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}
