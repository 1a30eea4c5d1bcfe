/// Portfolio Monitor Dataset Implementation
///
/// A Dataset is the in-memory result of one query run: a collection of typed
/// columns sharing a schema, with one identifier field naming each record.
/// Datasets are built once and then shared read-only (`Rc<Dataset>`); a new
/// run produces a new Dataset that replaces the old one wholesale.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::{ColumnType, ColumnValue, Dataset, Schema};
/// use std::collections::HashMap;
///
/// let schema = Schema::new(vec![
///     ("ID".to_string(), ColumnType::String, false),
///     ("Country".to_string(), ColumnType::String, true),
///     ("Yield to Worst".to_string(), ColumnType::Float64, true),
/// ]);
///
/// let mut dataset = Dataset::new("bonds".to_string(), schema, "ID").unwrap();
///
/// let mut row = HashMap::new();
/// row.insert("ID".to_string(), ColumnValue::from("XS0001 Corp"));
/// row.insert("Country".to_string(), ColumnValue::from("Italy"));
/// row.insert("Yield to Worst".to_string(), ColumnValue::Float64(3.75));
/// dataset.append_row(row).unwrap();
///
/// assert_eq!(dataset.len(), 1);
/// assert_eq!(dataset.get_value(0, "Country"), Some(ColumnValue::from("Italy")));
/// assert_eq!(dataset.row_of("XS0001 Corp"), Some(0));
/// ```

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{DatasetError, SchemaError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One record as a field-name to value map.
pub type Record = HashMap<String, ColumnValue>;

/// Stable unique identifier of a record (ticker, ISIN, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RecordId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId(id)
    }
}

/// Schema definition with field names and types.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("ID".to_string(), ColumnType::String, false),
///     ("Industry".to_string(), ColumnType::String, true),
///     ("Z-Spread".to_string(), ColumnType::Float64, true),
/// ]);
///
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.get_column_index("Industry"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    /// Creates a new schema from `(field_name, field_type, is_nullable)` tuples.
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    /// Infers a schema from JSON objects, looking at every record. Fields
    /// keep the order in which records first list them, and each one takes
    /// the narrowest type holding all of its non-null values:
    ///
    /// - integers only: `Int64`; any other number widens to `Float64`;
    /// - strings shaped like `YYYY-MM-DD` only: `Date`;
    /// - booleans only: `Bool`;
    /// - anything else, or only nulls: `String`.
    ///
    /// `id_field` is always a non-nullable `String`; numeric identifiers are
    /// read as their JSON text. Every other field is nullable.
    pub fn infer_from_json(records: &[JsonValue], id_field: &str) -> Result<Self, DatasetError> {
        let mut fields: Vec<(String, Option<ColumnType>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (row_idx, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                DatasetError::Json(format!("record {} is not a JSON object", row_idx))
            })?;

            for (name, value) in object {
                let index = *positions.entry(name.clone()).or_insert_with(|| {
                    fields.push((name.clone(), None));
                    fields.len() - 1
                });
                let inferred = &mut fields[index].1;
                if let Some(observed) = json_type(value) {
                    *inferred = Some(match *inferred {
                        None => observed,
                        Some(current) => widen(current, observed),
                    });
                }
            }
        }

        if !positions.contains_key(id_field) {
            fields.insert(0, (id_field.to_string(), Some(ColumnType::String)));
        }

        let columns = fields
            .into_iter()
            .map(|(name, column_type)| {
                if name == id_field {
                    (name, ColumnType::String, false)
                } else {
                    (name, column_type.unwrap_or(ColumnType::String), true)
                }
            })
            .collect();

        Ok(Schema { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(name, type, nullable)` for every field, in order.
    pub fn columns(&self) -> &[(String, ColumnType, bool)] {
        &self.columns
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// Returns `(name, type, nullable)` for the field at `index`.
    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType, bool)> {
        self.columns
            .get(index)
            .map(|(name, ty, nullable)| (name.as_str(), *ty, *nullable))
    }

    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_column_index(name).is_some()
    }

    /// Index of `name`, or `SchemaError::MissingField`.
    pub fn require(&self, name: &str) -> Result<usize, SchemaError> {
        self.get_column_index(name)
            .ok_or_else(|| SchemaError::MissingField(name.to_string()))
    }

    /// Index of a numeric field, or the matching `SchemaError`.
    pub fn require_numeric(&self, name: &str) -> Result<usize, SchemaError> {
        let index = self.require(name)?;
        let column_type = self.columns[index].1;
        if !column_type.is_numeric() {
            return Err(SchemaError::NotNumeric {
                field: name.to_string(),
                found: column_type,
            });
        }
        Ok(index)
    }
}

/// In-memory table of records sharing a schema.
pub struct Dataset {
    name: String,
    schema: Schema,
    id_field: String,
    columns: Vec<Column>,
    ids: Vec<RecordId>,
    id_index: HashMap<RecordId, usize>,
}

impl Dataset {
    /// Create an empty dataset. `id_field` must be a non-nullable `String`
    /// field of `schema`.
    pub fn new(name: String, schema: Schema, id_field: &str) -> Result<Self, DatasetError> {
        match schema.get_column_index(id_field).and_then(|i| schema.get_column_info(i)) {
            Some((_, ColumnType::String, false)) => {}
            _ => return Err(DatasetError::InvalidIdField(id_field.to_string())),
        }

        let columns: Vec<Column> = schema
            .columns
            .iter()
            .map(|(col_name, col_type, nullable)| Column::new(col_name.clone(), *col_type, *nullable))
            .collect();

        Ok(Dataset {
            name,
            schema,
            id_field: id_field.to_string(),
            columns,
            ids: Vec::new(),
            id_index: HashMap::new(),
        })
    }

    /// Build a dataset from rows; fails without partial state if any row is invalid.
    pub fn from_rows(
        name: String,
        schema: Schema,
        id_field: &str,
        rows: Vec<Record>,
    ) -> Result<Self, DatasetError> {
        let mut dataset = Dataset::new(name, schema, id_field)?;
        dataset.append_rows(rows)?;
        Ok(dataset)
    }

    /// Build a dataset from JSON objects typed by `schema`. Keys absent from
    /// a record are read as `null`; keys outside the schema are ignored.
    pub fn from_json_records(
        name: String,
        schema: Schema,
        id_field: &str,
        records: &[JsonValue],
    ) -> Result<Self, DatasetError> {
        let mut rows = Vec::with_capacity(records.len());

        for (row_idx, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                DatasetError::Json(format!("record {} is not a JSON object", row_idx))
            })?;

            let mut row = Record::with_capacity(schema.len());
            for (field, column_type, _) in &schema.columns {
                let value = object.get(field).unwrap_or(&JsonValue::Null);
                row.insert(field.clone(), json_to_column_value(field, value, *column_type)?);
            }
            rows.push(row);
        }

        Dataset::from_rows(name, schema, id_field, rows)
    }

    /// Parse a JSON array of records, inferring the schema from all of them.
    pub fn from_json_str(name: String, json: &str, id_field: &str) -> Result<Self, DatasetError> {
        let parsed: JsonValue =
            serde_json::from_str(json).map_err(|e| DatasetError::Json(e.to_string()))?;
        let records = parsed
            .as_array()
            .ok_or_else(|| DatasetError::Json("expected a JSON array of records".to_string()))?;

        let schema = Schema::infer_from_json(records, id_field)?;

        Dataset::from_json_records(name, schema, id_field, records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.get_column_index(name).map(|i| &self.columns[i])
    }

    /// Column for `name`, or `SchemaError::MissingField`.
    pub fn require_column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.schema.require(name).map(|i| &self.columns[i])
    }

    /// Numeric column for `name`, or the matching `SchemaError`.
    pub fn require_numeric_column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.schema.require_numeric(name).map(|i| &self.columns[i])
    }

    pub fn get_value(&self, row: usize, field: &str) -> Option<ColumnValue> {
        self.column(field)?.get(row)
    }

    pub fn get_row(&self, row: usize) -> Option<Record> {
        if row >= self.len() {
            return None;
        }

        let mut result = Record::with_capacity(self.columns.len());
        for col in &self.columns {
            result.insert(col.name().to_string(), col.get(row)?);
        }
        Some(result)
    }

    pub fn record_id(&self, row: usize) -> Option<&RecordId> {
        self.ids.get(row)
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Row position of a record identifier.
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.id_index.get(id).copied()
    }

    /// Sorted distinct non-missing values of a field.
    pub fn distinct_values(&self, field: &str) -> Result<Vec<ColumnValue>, SchemaError> {
        Ok(self.require_column(field)?.distinct_values())
    }

    pub fn append_row(&mut self, row: Record) -> Result<(), DatasetError> {
        self.append_rows(vec![row]).map(|_| ())
    }

    /// Append multiple rows at once.
    ///
    /// Every row is validated (missing fields, types, nullability, identifier
    /// uniqueness) before any is stored, so an error leaves the dataset as it was.
    pub fn append_rows(&mut self, rows: Vec<Record>) -> Result<usize, DatasetError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let start_index = self.len();
        let id_col = self.schema.require(&self.id_field)?;
        let mut validated: Vec<Vec<ColumnValue>> = Vec::with_capacity(rows.len());
        let mut new_ids: Vec<RecordId> = Vec::with_capacity(rows.len());
        let mut seen: HashSet<RecordId> = HashSet::with_capacity(rows.len());

        for (row_offset, mut row) in rows.into_iter().enumerate() {
            let row_idx = start_index + row_offset;
            let mut values = Vec::with_capacity(self.columns.len());

            for col in &self.columns {
                let value = row.remove(col.name()).ok_or_else(|| DatasetError::MissingValue {
                    row: row_idx,
                    field: col.name().to_string(),
                })?;
                values.push(col.validate_value(value)?);
            }

            let id = match &values[id_col] {
                ColumnValue::String(s) => RecordId::from(s.as_str()),
                _ => return Err(DatasetError::InvalidIdField(self.id_field.clone())),
            };
            if self.id_index.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(DatasetError::DuplicateId(id.to_string()));
            }

            new_ids.push(id);
            validated.push(values);
        }

        let num_rows = validated.len();
        for values in validated {
            for (col, value) in self.columns.iter_mut().zip(values) {
                col.push(value)?;
            }
        }

        for (offset, id) in new_ids.into_iter().enumerate() {
            self.id_index.insert(id.clone(), start_index + offset);
            self.ids.push(id);
        }

        Ok(num_rows)
    }

    /// Iterate over row positions and records.
    pub fn iter_rows(&self) -> impl Iterator<Item = (usize, Record)> + '_ {
        (0..self.len()).filter_map(move |i| self.get_row(i).map(|r| (i, r)))
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset {{ name: '{}', id_field: '{}', fields: {}, len: {} }}",
            self.name,
            self.id_field,
            self.schema.len(),
            self.len()
        )
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Type of a single JSON value; `None` for `null`.
fn json_type(value: &JsonValue) -> Option<ColumnType> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some(ColumnType::Bool),
        JsonValue::Number(n) if n.is_i64() => Some(ColumnType::Int64),
        JsonValue::Number(_) => Some(ColumnType::Float64),
        JsonValue::String(s) if parse_date(s).is_some() => Some(ColumnType::Date),
        _ => Some(ColumnType::String),
    }
}

/// Narrowest type holding values of both `a` and `b`.
fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    match (a, b) {
        (a, b) if a == b => a,
        (ColumnType::Int64 | ColumnType::Float64, ColumnType::Int64 | ColumnType::Float64) => {
            ColumnType::Float64
        }
        _ => ColumnType::String,
    }
}

fn json_to_column_value(
    field: &str,
    value: &JsonValue,
    column_type: ColumnType,
) -> Result<ColumnValue, DatasetError> {
    let mismatch = || DatasetError::TypeMismatch {
        field: field.to_string(),
        expected: column_type,
        found: value.to_string(),
    };

    match (value, column_type) {
        (JsonValue::Null, _) => Ok(ColumnValue::Null),
        (JsonValue::Bool(b), ColumnType::Bool) => Ok(ColumnValue::Bool(*b)),
        (JsonValue::Number(n), ColumnType::Int32) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(ColumnValue::Int32)
            .ok_or_else(mismatch),
        (JsonValue::Number(n), ColumnType::Int64) => {
            n.as_i64().map(ColumnValue::Int64).ok_or_else(mismatch)
        }
        (JsonValue::Number(n), ColumnType::Float64) => {
            n.as_f64().map(ColumnValue::Float64).ok_or_else(mismatch)
        }
        (JsonValue::String(s), ColumnType::String) => Ok(ColumnValue::String(s.clone())),
        (JsonValue::Number(_) | JsonValue::Bool(_), ColumnType::String) => {
            Ok(ColumnValue::String(value.to_string()))
        }
        (JsonValue::String(s), ColumnType::Date) => {
            parse_date(s).map(ColumnValue::Date).ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}
