//! Core type definitions for gridtabledb.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

// ============================================================================
// DATA TYPES
// ============================================================================

/// The type tag of a column.
///
/// The set is closed: every stored value is one of these four variants, so
/// comparisons never need to inspect types at runtime beyond a `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit IEEE float.
    Double,
    /// UTF-8 text.
    Text,
    /// Calendar date with day precision.
    Date,
}

impl DataType {
    /// Whether a grid index can partition columns of this type.
    ///
    /// Text has no meaningful equal-width range split.
    #[inline]
    pub fn is_indexable(&self) -> bool {
        !matches!(self, DataType::Text)
    }

    /// Parse a type name such as `"int"` or `"DATE"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(DataType::Int),
            "double" | "float" => Some(DataType::Double),
            "text" | "varchar" | "string" => Some(DataType::Text),
            "date" => Some(DataType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "INT",
            DataType::Double => "DOUBLE",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
        };
        f.write_str(name)
    }
}

// ============================================================================
// DATES
// ============================================================================

/// `NaiveDate::from_ymd(1970, 1, 1).num_days_from_ce()`.
pub const UNIX_EPOCH_DAYS: i32 = 719_163;

/// A date stored as the number of days since 1970-01-01.
///
/// Storing the day count keeps dates cheap to compare and lets the grid index
/// split a date domain with plain integer arithmetic.
///
/// # Example
/// ```
/// use gridtabledb_core::Date;
///
/// let date = Date::parse("1970-01-11").unwrap();
/// assert_eq!(date.days(), 10);
/// assert_eq!(date.to_string(), "1970-01-11");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Date(i32);

impl Date {
    /// Create a date from a day count relative to the Unix epoch.
    #[inline]
    pub const fn new(days: i32) -> Self {
        Date(days)
    }

    /// Create a date from its calendar parts.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|date| Date(date.num_days_from_ce() - UNIX_EPOCH_DAYS))
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> chrono::ParseResult<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|date| Date(date.num_days_from_ce() - UNIX_EPOCH_DAYS))
    }

    /// Days since 1970-01-01.
    #[inline]
    pub fn days(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self
            .0
            .checked_add(UNIX_EPOCH_DAYS)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
        {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "Date({})", self.0),
        }
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A typed field value.
///
/// `Value` has a total order: doubles compare with [`f64::total_cmp`], and
/// values of different variants order by variant (Int < Double < Text < Date).
/// Validated input never mixes variants within a column, so the cross-variant
/// order only exists to keep `Ord` lawful.
///
/// # Example
/// ```
/// use gridtabledb_core::{DataType, Value};
///
/// let a = Value::Int(3);
/// let b = Value::parse(DataType::Int, "10").unwrap();
/// assert!(a < b);
/// assert_eq!(b.data_type(), DataType::Int);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Double(f64),
    Text(String),
    Date(Date),
}

impl Value {
    /// The type tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Double(_) => DataType::Double,
            Value::Text(_) => DataType::Text,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Whether the value can be persisted. JSON has no NaN or infinity, so
    /// only finite doubles qualify.
    #[inline]
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Double(v) => v.is_finite(),
            _ => true,
        }
    }

    /// Parse a textual literal into a value of the given type.
    ///
    /// Used for catalog min/max bounds, which are stored as strings. Doubles
    /// must be finite.
    pub fn parse(data_type: DataType, input: &str) -> Result<Self, ValueError> {
        let parse_error = || ValueError::Parse {
            input: input.to_string(),
            data_type,
        };
        let trimmed = input.trim();
        match data_type {
            DataType::Int => trimmed.parse().map(Value::Int).map_err(|_| parse_error()),
            DataType::Double => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Double)
                .ok_or_else(parse_error),
            DataType::Text => Ok(Value::Text(input.to_string())),
            DataType::Date => Date::parse(trimmed)
                .map(Value::Date)
                .map_err(|_| parse_error()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Double(_) => 1,
            Value::Text(_) => 2,
            Value::Date(_) => 3,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Value::Date(v)
    }
}

// ============================================================================
// TESTS
// ============================================================================
