use crate::error::{Result, VizcatError};
use serde::Serialize;
use std::fmt;

/// Sky position as sexagesimal strings, passed to the query service verbatim.
#[derive(Debug, Clone)]
pub struct Coordinate {
    pub ra: String,
    pub dec: String,
}

impl Coordinate {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
        }
    }

    /// Target string in the form the query service expects.
    pub fn target(&self) -> String {
        format!("{} {}", self.ra, self.dec)
    }
}

/// Expected type of one output column.
///
/// Closed enumeration resolved from descriptor text through a lookup; an
/// unrecognized name is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

impl ColumnType {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "str" | "string" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            other => Err(VizcatError::Config(format!(
                "Unknown column type '{}'",
                other
            ))),
        }
    }
}

/// One cleaned scalar value. `Missing` stands in for a numeric field whose
/// raw text did not parse; it serializes as JSON null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Int(i64),
    Real(f64),
    Text(String),
    Missing,
}

impl Field {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Real(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
            Field::Missing => write!(f, "nan"),
        }
    }
}

/// One cleaned data row, one field per configured column type.
pub type CleanedRow = Vec<Field>;

/// Parameters for a single catalog query, composed from a descriptor plus
/// the session coordinate.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub source: String,
    pub target: String,
    pub radius: String,
    pub output: String,
    pub max_rows: String,
}
