/// Portfolio Monitor Column Implementation
///
/// A Column is an array-like random-access container holding one field of a
/// dataset. Each Column has a type specifying the type of every value stored.
///
/// # Categorical columns
///
/// String columns are dictionary-encoded: every distinct label is stored once
/// in the column's `StringInterner` and rows keep a code. Distinct values for
/// matrix rows and filter options are read from the dictionary.

use crate::error::DatasetError;
use crate::interner::{StringId, StringInterner};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int32,
    Int64,
    Float64,
    String,
    Bool,
    Date,
}

impl ColumnType {
    /// Returns true for types that can be bucketed, brushed or aggregated.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int32 | ColumnType::Int64 | ColumnType::Float64)
    }
}

/// Column value enum to support multiple types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl ColumnValue {
    /// Missing values are `Null` and floating-point `NaN`.
    pub fn is_null(&self) -> bool {
        match self {
            ColumnValue::Null => true,
            ColumnValue::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ColumnValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int32(v) => Some(*v as i64),
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`. `NaN` is reported as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int32(v) => Some(*v as f64),
            ColumnValue::Int64(v) => Some(*v as f64),
            ColumnValue::Float64(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ColumnValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            _ if self.is_null() => 4,
            ColumnValue::Int32(_) | ColumnValue::Int64(_) | ColumnValue::Float64(_) => 0,
            ColumnValue::String(_) => 1,
            ColumnValue::Date(_) => 2,
            ColumnValue::Bool(_) => 3,
            ColumnValue::Null => 4,
        }
    }

    /// Total order used for sorted labels, sort keys and membership tests.
    ///
    /// Numbers compare by value across integer and float variants, then come
    /// strings, dates and booleans. Missing values sort last.
    pub fn total_cmp(&self, other: &ColumnValue) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (a, b) if a.is_null() && b.is_null() => Ordering::Equal,
            (ColumnValue::String(a), ColumnValue::String(b)) => a.cmp(b),
            (ColumnValue::Date(a), ColumnValue::Date(b)) => a.cmp(b),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a.cmp(b),
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    _ => Ordering::Equal,
                },
            },
        }
    }

    /// Value equality under `total_cmp` (`Int32(1)` equals `Float64(1.0)`).
    pub fn same_value(&self, other: &ColumnValue) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int32(v) => write!(f, "{}", v),
            ColumnValue::Int64(v) => write!(f, "{}", v),
            ColumnValue::Float64(v) if v.is_nan() => Ok(()),
            ColumnValue::Float64(v) => write!(f, "{}", v),
            ColumnValue::String(v) => f.write_str(v),
            ColumnValue::Bool(v) => write!(f, "{}", v),
            ColumnValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            ColumnValue::Null => Ok(()),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::String(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::String(v)
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Float64(v)
    }
}

impl From<i32> for ColumnValue {
    fn from(v: i32) -> Self {
        ColumnValue::Int32(v)
    }
}

impl From<NaiveDate> for ColumnValue {
    fn from(v: NaiveDate) -> Self {
        ColumnValue::Date(v)
    }
}

enum Storage {
    Values(Vec<ColumnValue>),
    /// String columns: one code per row, `None` for null.
    Dictionary {
        codes: Vec<Option<StringId>>,
        interner: StringInterner,
    },
}

/// A typed, append-only column.
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    storage: Storage,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        let storage = match column_type {
            ColumnType::String => Storage::Dictionary {
                codes: Vec::new(),
                interner: StringInterner::new(),
            },
            _ => Storage::Values(Vec::new()),
        };

        Column {
            name,
            column_type,
            nullable,
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Values(values) => values.len(),
            Storage::Dictionary { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate a value against the column type, widening integers where
    /// the column is wider.
    pub fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue, DatasetError> {
        if value.is_null() {
            if !self.nullable {
                return Err(DatasetError::NotNullable(self.name.clone()));
            }
            return Ok(ColumnValue::Null);
        }

        match (value, self.column_type) {
            (v @ ColumnValue::Int32(_), ColumnType::Int32) => Ok(v),
            (v @ ColumnValue::Int64(_), ColumnType::Int64) => Ok(v),
            (ColumnValue::Int32(v), ColumnType::Int64) => Ok(ColumnValue::Int64(v as i64)),
            (v @ ColumnValue::Float64(_), ColumnType::Float64) => Ok(v),
            (ColumnValue::Int32(v), ColumnType::Float64) => Ok(ColumnValue::Float64(v as f64)),
            (ColumnValue::Int64(v), ColumnType::Float64) => Ok(ColumnValue::Float64(v as f64)),
            (v @ ColumnValue::String(_), ColumnType::String) => Ok(v),
            (v @ ColumnValue::Bool(_), ColumnType::Bool) => Ok(v),
            (v @ ColumnValue::Date(_), ColumnType::Date) => Ok(v),
            (other, expected) => Err(DatasetError::TypeMismatch {
                field: self.name.clone(),
                expected,
                found: format!("{:?}", other),
            }),
        }
    }

    pub fn push(&mut self, value: ColumnValue) -> Result<(), DatasetError> {
        let value = self.validate_value(value)?;

        match &mut self.storage {
            Storage::Values(values) => values.push(value),
            Storage::Dictionary { codes, interner } => {
                let code = match value {
                    ColumnValue::String(ref s) => Some(interner.intern(s)),
                    _ => None,
                };
                codes.push(code);
            }
        }

        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<ColumnValue> {
        match &self.storage {
            Storage::Values(values) => values.get(index).cloned(),
            Storage::Dictionary { codes, interner } => match codes.get(index)? {
                Some(id) => interner
                    .resolve(*id)
                    .map(|s| ColumnValue::String(s.to_string())),
                None => Some(ColumnValue::Null),
            },
        }
    }

    /// Fast numeric access without cloning. Returns None if the value is
    /// missing, not numeric, or the index is out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match &self.storage {
            Storage::Values(values) => values.get(index).and_then(|v| v.as_f64()),
            Storage::Dictionary { .. } => None,
        }
    }

    /// Borrow a string value without allocating.
    #[inline]
    pub fn get_str(&self, index: usize) -> Option<&str> {
        match &self.storage {
            Storage::Dictionary { codes, interner } => {
                codes.get(index).copied().flatten().and_then(|id| interner.resolve(id))
            }
            Storage::Values(_) => None,
        }
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        match &self.storage {
            Storage::Values(values) => values.get(index).map_or(true, |v| v.is_null()),
            Storage::Dictionary { codes, .. } => codes.get(index).map_or(true, |c| c.is_none()),
        }
    }

    /// Sorted distinct non-missing values.
    pub fn distinct_values(&self) -> Vec<ColumnValue> {
        match &self.storage {
            Storage::Dictionary { interner, .. } => interner
                .sorted_strings()
                .into_iter()
                .map(ColumnValue::from)
                .collect(),
            Storage::Values(values) => {
                let mut distinct: Vec<ColumnValue> =
                    values.iter().filter(|v| !v.is_null()).cloned().collect();
                distinct.sort_by(|a, b| a.total_cmp(b));
                distinct.dedup_by(|a, b| a.same_value(b));
                distinct
            }
        }
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}
