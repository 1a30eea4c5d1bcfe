/// Clean-up applied to a raw query result before it is loaded
///
/// Query services return cryptic column names, codes instead of labels and
/// placeholder records. Each step here reads a dataset and returns a new one;
/// the input is never modified, so a loaded dataset stays valid for the views
/// holding it.

use crate::column::{ColumnType, ColumnValue};
use crate::dataset::{Dataset, Record, Schema};
use crate::error::DatasetError;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};

/// Identifier segment marking placeholder records.
pub const NULL_GROUP: &str = "NullGroup";

fn rows_where(dataset: &Dataset, keep: impl Fn(usize) -> bool) -> Vec<Record> {
    (0..dataset.len())
        .filter(|&r| keep(r))
        .filter_map(|r| dataset.get_row(r))
        .collect()
}

/// Rename fields, e.g. `("CNTRY_OF_RISK()", "Country")`. Renaming the
/// identifier field moves the identifier with it.
pub fn rename_fields(dataset: &Dataset, renames: &[(&str, &str)]) -> Result<Dataset, DatasetError> {
    let mapping: HashMap<&str, &str> = renames.iter().copied().collect();
    for from in mapping.keys() {
        dataset.schema().require(from)?;
    }

    let mut columns = Vec::with_capacity(dataset.schema().len());
    let mut seen = BTreeSet::new();
    for (name, column_type, nullable) in dataset.schema().columns() {
        let renamed = mapping.get(name.as_str()).copied().unwrap_or(name.as_str());
        if !seen.insert(renamed) {
            return Err(DatasetError::DuplicateField(renamed.to_string()));
        }
        columns.push((renamed.to_string(), *column_type, *nullable));
    }

    let id_field = mapping
        .get(dataset.id_field())
        .copied()
        .unwrap_or(dataset.id_field());

    let rows: Vec<Record> = rows_where(dataset, |_| true)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(field, value)| match mapping.get(field.as_str()) {
                    Some(to) => (to.to_string(), value),
                    None => (field, value),
                })
                .collect::<Record>()
        })
        .collect();

    Dataset::from_rows(dataset.name().to_string(), Schema::new(columns), id_field, rows)
}

/// Derive `target` by looking up each `source` value (by its text form) in
/// `mapping`, e.g. country code to country name or rating to score.
///
/// Unmapped values become missing and are reported once with a warning. An
/// existing `target` field is replaced in place; otherwise it is appended.
pub fn map_values(
    dataset: &Dataset,
    source: &str,
    target: &str,
    mapping: &HashMap<String, ColumnValue>,
    target_type: ColumnType,
) -> Result<Dataset, DatasetError> {
    let source_col = dataset.require_column(source)?;
    if target == dataset.id_field() {
        return Err(DatasetError::InvalidIdField(target.to_string()));
    }

    let mut columns: Vec<(String, ColumnType, bool)> = dataset.schema().columns().to_vec();
    match columns.iter_mut().find(|(name, _, _)| name == target) {
        Some(column) => *column = (target.to_string(), target_type, true),
        None => columns.push((target.to_string(), target_type, true)),
    }

    let mut unmapped = BTreeSet::new();
    let mut rows = Vec::with_capacity(dataset.len());
    for (r, mut row) in dataset.iter_rows() {
        let value = match source_col.get(r) {
            Some(v) if !v.is_null() => {
                let key = v.to_string();
                match mapping.get(&key) {
                    Some(mapped) => mapped.clone(),
                    None => {
                        unmapped.insert(key);
                        ColumnValue::Null
                    }
                }
            }
            _ => ColumnValue::Null,
        };
        row.insert(target.to_string(), value);
        rows.push(row);
    }

    if !unmapped.is_empty() {
        warn!(
            "{}: {} value(s) of '{}' have no '{}' mapping: {:?}",
            dataset.name(),
            unmapped.len(),
            source,
            target,
            unmapped
        );
    }

    Dataset::from_rows(
        dataset.name().to_string(),
        Schema::new(columns),
        dataset.id_field(),
        rows,
    )
}

/// Remove placeholder records whose identifier has a `NullGroup` segment
/// when split on `:`.
pub fn drop_null_groups(dataset: &Dataset) -> Result<Dataset, DatasetError> {
    let is_placeholder = |r: usize| {
        dataset
            .record_id(r)
            .map_or(false, |id| id.as_str().split(':').any(|s| s == NULL_GROUP))
    };

    let rows = rows_where(dataset, |r| !is_placeholder(r));
    let dropped = dataset.len() - rows.len();
    if dropped > 0 {
        info!("{}: dropped {} null-group record(s)", dataset.name(), dropped);
    }

    Dataset::from_rows(
        dataset.name().to_string(),
        dataset.schema().clone(),
        dataset.id_field(),
        rows,
    )
}

/// Remove records whose `field` equals `value` (e.g. country `"NA"`).
/// Missing values are kept.
pub fn exclude_value(
    dataset: &Dataset,
    field: &str,
    value: &ColumnValue,
) -> Result<Dataset, DatasetError> {
    let column = dataset.require_column(field)?;
    let rows = rows_where(dataset, |r| {
        column.get(r).map_or(true, |v| v.is_null() || !v.same_value(value))
    });

    let dropped = dataset.len() - rows.len();
    if dropped > 0 {
        info!("{}: excluded {} record(s) with {} = {}", dataset.name(), dropped, field, value);
    }

    Dataset::from_rows(
        dataset.name().to_string(),
        dataset.schema().clone(),
        dataset.id_field(),
        rows,
    )
}
