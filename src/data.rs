//! Core value types shared across the index.
//!
//! This module defines:
//! - [`DocumentId`] - The opaque external identifier of a document
//! - [`InternalId`] - The compact integer identifier used inside the index
//! - [`DataValue`] - The value ingested for one property of a document
//! - [`GeoPoint`] - A validated geographic coordinate pair

use serde::{Deserialize, Serialize};

use crate::error::{CallaError, Result};

/// Compact identifier for a document within this process.
///
/// Allocated by the external id store; every sub-index stores only these.
pub type InternalId = u64;

/// Opaque external identifier of a document, string or integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// String identifier (e.g. a UUID or slug).
    Text(String),
    /// Integer identifier.
    Number(u64),
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentId::Text(s) => write!(f, "{}", s),
            DocumentId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(v: &str) -> Self {
        DocumentId::Text(v.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(v: String) -> Self {
        DocumentId::Text(v)
    }
}

impl From<u64> for DocumentId {
    fn from(v: u64) -> Self {
        DocumentId::Number(v)
    }
}

/// Geographic point (latitude, longitude), in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point, validating coordinate ranges.
    ///
    /// Latitude must lie in `[-90, 90]` and longitude in `[-180, 180]`;
    /// non-finite values are rejected.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CallaError::invalid_geo_point(lat, lon));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(CallaError::invalid_geo_point(lat, lon));
        }
        Ok(Self { lat, lon })
    }
}

/// The value ingested for one property of a document.
///
/// Array variants exist for every scalar type that the schema can mark
/// as an array; geopoints and vectors are always scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    /// Text content to be tokenized and full-text indexed.
    Text(String),
    /// Array of text values.
    TextList(Vec<String>),
    /// Numeric value for range queries.
    Number(f64),
    /// Array of numeric values.
    NumberList(Vec<f64>),
    /// Boolean value.
    Bool(bool),
    /// Array of boolean values.
    BoolList(Vec<bool>),
    /// Exact-match key for enum properties. Never tokenized.
    Enum(String),
    /// Array of exact-match keys.
    EnumList(Vec<String>),
    /// Geographic point.
    Geo(GeoPoint),
    /// Pre-computed dense vector.
    Vector(Vec<f32>),
}

impl DataValue {
    /// Returns the text value if this is a Text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a Number variant.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Bool variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the enum key if this is an Enum variant.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            DataValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the geographic point if this is a Geo variant.
    pub fn as_geo(&self) -> Option<GeoPoint> {
        match self {
            DataValue::Geo(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns the vector data if this is a Vector variant.
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            DataValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DataValue::Text(_) => "string",
            DataValue::TextList(_) => "string[]",
            DataValue::Number(_) => "number",
            DataValue::NumberList(_) => "number[]",
            DataValue::Bool(_) => "boolean",
            DataValue::BoolList(_) => "boolean[]",
            DataValue::Enum(_) => "enum",
            DataValue::EnumList(_) => "enum[]",
            DataValue::Geo(_) => "geopoint",
            DataValue::Vector(_) => "vector",
        }
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::Text(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Number(v)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Number(v as f64)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Bool(v)
    }
}

impl From<GeoPoint> for DataValue {
    fn from(v: GeoPoint) -> Self {
        DataValue::Geo(v)
    }
}

impl From<Vec<f32>> for DataValue {
    fn from(v: Vec<f32>) -> Self {
        DataValue::Vector(v)
    }
}

impl From<Vec<f64>> for DataValue {
    fn from(v: Vec<f64>) -> Self {
        DataValue::NumberList(v)
    }
}

impl From<Vec<String>> for DataValue {
    fn from(v: Vec<String>) -> Self {
        DataValue::TextList(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(45.0, 9.0).is_ok());
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_document_id_display() {
        assert_eq!(DocumentId::from("doc-1").to_string(), "doc-1");
        assert_eq!(DocumentId::from(42u64).to_string(), "42");
    }

    #[test]
    fn test_data_value_accessors() {
        assert_eq!(DataValue::from("hello").as_text(), Some("hello"));
        assert_eq!(DataValue::from(3.5).as_number(), Some(3.5));
        assert_eq!(DataValue::from(true).as_bool(), Some(true));
        assert_eq!(DataValue::Enum("red".to_string()).as_enum(), Some("red"));
        assert_eq!(
            DataValue::from(vec![1.0f32]).as_vector(),
            Some(&[1.0f32][..])
        );
        assert_eq!(DataValue::from("hello").as_number(), None);
    }

    #[test]
    fn test_enum_and_text_are_distinct() {
        // A string property's value and an enum property's value never
        // share a constructor.
        assert_eq!(DataValue::from("red").as_enum(), None);
        assert_eq!(DataValue::Enum("red".to_string()).as_text(), None);
    }

    #[test]
    fn test_data_value_kind() {
        assert_eq!(DataValue::from(vec![1.0f64, 2.0]).kind(), "number[]");
        assert_eq!(DataValue::Enum("red".to_string()).kind(), "enum");
        assert_eq!(DataValue::EnumList(vec!["a".to_string()]).kind(), "enum[]");
        let p = GeoPoint { lat: 0.0, lon: 0.0 };
        assert_eq!(DataValue::Geo(p).kind(), "geopoint");
    }
}
