//! Error types for calla.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, CallaError>;

/// Errors reported by the indexing core.
///
/// Every failure is synchronous and carries the offending property path
/// plus the parameters needed to understand it. The stable string tag of
/// each variant is available through [`CallaError::tag`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallaError {
    /// The schema declared a property with an unsupported type, or a
    /// value did not match the declared type.
    #[error("unsupported schema type '{type_name}' for property '{path}'")]
    InvalidSchemaType { path: String, type_name: String },

    /// A where-clause referenced a property the schema does not index.
    #[error("unknown filter property '{path}'")]
    UnknownFilterProperty { path: String },

    /// A predicate does not apply to the sub-index owning the property.
    #[error("invalid filter operation on property '{path}': {detail}")]
    InvalidFilterOperation { path: String, detail: String },

    /// A text search targeted a property that is not a text index.
    #[error("property '{path}' is not searchable as text")]
    WrongSearchPropertyType { path: String },

    /// Boost values must be strictly positive.
    #[error("boost for property '{path}' must be greater than zero")]
    InvalidBoostValue { path: String },

    /// A vector did not match the size declared in the schema.
    #[error("vector for property '{path}' has size {got}, expected {expected}")]
    InvalidVectorSize {
        path: String,
        expected: usize,
        got: usize,
    },

    /// Latitude or longitude outside the valid coordinate ranges.
    #[error("invalid geopoint: latitude {lat}, longitude {lon}")]
    InvalidGeoPoint { lat: f64, lon: f64 },
}

impl CallaError {
    /// Create an invalid schema type error.
    pub fn invalid_schema_type(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        CallaError::InvalidSchemaType {
            path: path.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an unknown filter property error.
    pub fn unknown_filter_property(path: impl Into<String>) -> Self {
        CallaError::UnknownFilterProperty { path: path.into() }
    }

    /// Create an invalid filter operation error.
    pub fn invalid_filter_operation(path: impl Into<String>, detail: impl Into<String>) -> Self {
        CallaError::InvalidFilterOperation {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a wrong search property type error.
    pub fn wrong_search_property_type(path: impl Into<String>) -> Self {
        CallaError::WrongSearchPropertyType { path: path.into() }
    }

    /// Create an invalid boost value error.
    pub fn invalid_boost_value(path: impl Into<String>) -> Self {
        CallaError::InvalidBoostValue { path: path.into() }
    }

    /// Create an invalid vector size error.
    pub fn invalid_vector_size(path: impl Into<String>, expected: usize, got: usize) -> Self {
        CallaError::InvalidVectorSize {
            path: path.into(),
            expected,
            got,
        }
    }

    /// Create an invalid geopoint error.
    pub fn invalid_geo_point(lat: f64, lon: f64) -> Self {
        CallaError::InvalidGeoPoint { lat, lon }
    }

    /// The stable string tag identifying this error class.
    pub fn tag(&self) -> &'static str {
        match self {
            CallaError::InvalidSchemaType { .. } => "INVALID_SCHEMA_TYPE",
            CallaError::UnknownFilterProperty { .. } => "UNKNOWN_FILTER_PROPERTY",
            CallaError::InvalidFilterOperation { .. } => "INVALID_FILTER_OPERATION",
            CallaError::WrongSearchPropertyType { .. } => "WRONG_SEARCH_PROPERTY_TYPE",
            CallaError::InvalidBoostValue { .. } => "INVALID_BOOST_VALUE",
            CallaError::InvalidVectorSize { .. } => "INVALID_VECTOR_SIZE",
            CallaError::InvalidGeoPoint { .. } => "INVALID_GEO_POINT",
        }
    }
}
