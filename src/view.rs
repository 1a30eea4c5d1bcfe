/// Portfolio Monitor Views
///
/// Views are read-only projections of a `Selection` for the linked panels:
/// the securities table, the scatter plot and the model-portfolio detail tab.
/// A view is rebuilt from the current selection whenever it changes; none of
/// them is patched in place.

use crate::column::{Column, ColumnValue};
use crate::dataset::{Dataset, Record, RecordId};
use crate::error::SchemaError;
use crate::selection::Selection;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::rc::Rc;

/// Sort order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    /// Ascending order (smallest first)
    Ascending,
    /// Descending order (largest first)
    Descending,
}

/// A single sort key specifying a column and order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
    /// Whether missing values are placed first or last
    pub nulls_first: bool,
}

impl SortKey {
    /// Ascending, nulls last
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Ascending,
            nulls_first: false,
        }
    }

    /// Descending, nulls last
    pub fn descending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Descending,
            nulls_first: false,
        }
    }

    pub fn new(column: impl Into<String>, order: SortOrder, nulls_first: bool) -> Self {
        SortKey {
            column: column.into(),
            order,
            nulls_first,
        }
    }

    /// Compare two values under this key. Missing values ignore `order`.
    pub fn compare(&self, a: &ColumnValue, b: &ColumnValue) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) if self.nulls_first => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, true) if self.nulls_first => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match self.order {
                SortOrder::Ascending => a.total_cmp(b),
                SortOrder::Descending => a.total_cmp(b).reverse(),
            },
        }
    }
}

/// The securities table: selected records projected onto a list of columns
/// and ordered by sort keys.
///
/// Rows with equal keys keep their dataset order.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::{ColumnType, ColumnValue, Dataset, Schema, Selection, SortKey, TableView};
/// use std::collections::HashMap;
/// use std::rc::Rc;
///
/// let schema = Schema::new(vec![
///     ("ID".to_string(), ColumnType::String, false),
///     ("Yield".to_string(), ColumnType::Float64, true),
/// ]);
/// let mut dataset = Dataset::new("bonds".to_string(), schema, "ID").unwrap();
/// for (id, y) in [("B1", 2.5), ("B2", 4.0)] {
///     let mut row = HashMap::new();
///     row.insert("ID".to_string(), ColumnValue::from(id));
///     row.insert("Yield".to_string(), ColumnValue::Float64(y));
///     dataset.append_row(row).unwrap();
/// }
/// let dataset = Rc::new(dataset);
///
/// let table = TableView::new(
///     dataset.clone(),
///     &Selection::all(&dataset),
///     vec!["ID".to_string(), "Yield".to_string()],
///     vec![SortKey::descending("Yield")],
/// )
/// .unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get_value(0, "ID"), Some(ColumnValue::from("B2")));
/// ```
#[derive(Debug)]
pub struct TableView {
    dataset: Rc<Dataset>,
    columns: Vec<String>,
    sort_keys: Vec<SortKey>,
    /// Dataset row for each view position
    rows: Vec<usize>,
}

impl TableView {
    /// An empty `columns` list shows every field of the schema.
    pub fn new(
        dataset: Rc<Dataset>,
        selection: &Selection,
        columns: Vec<String>,
        sort_keys: Vec<SortKey>,
    ) -> Result<Self, SchemaError> {
        let columns = if columns.is_empty() {
            dataset
                .schema()
                .get_column_names()
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            for column in &columns {
                dataset.schema().require(column)?;
            }
            columns
        };

        let rows = selection.iter().filter(|&r| r < dataset.len()).collect();
        let mut view = TableView {
            dataset,
            columns,
            sort_keys: Vec::new(),
            rows,
        };
        view.sort_by(sort_keys)?;
        Ok(view)
    }

    /// Reorder the rows by new sort keys.
    pub fn sort_by(&mut self, sort_keys: Vec<SortKey>) -> Result<(), SchemaError> {
        let mut key_columns = Vec::with_capacity(sort_keys.len());
        for key in &sort_keys {
            key_columns.push(self.dataset.require_column(&key.column)?);
        }

        if !key_columns.is_empty() {
            let value = |col: &Column, row: usize| col.get(row).unwrap_or(ColumnValue::Null);
            self.rows.sort_by(|&a, &b| {
                for (key, col) in sort_keys.iter().zip(&key_columns) {
                    let cmp = key.compare(&value(col, a), &value(col, b));
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                a.cmp(&b)
            });
        }

        self.sort_keys = sort_keys;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    /// Dataset row shown at a view position.
    pub fn dataset_row(&self, index: usize) -> Option<usize> {
        self.rows.get(index).copied()
    }

    pub fn record_id(&self, index: usize) -> Option<&RecordId> {
        self.dataset.record_id(self.dataset_row(index)?)
    }

    /// Identifiers in display order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.rows
            .iter()
            .filter_map(|&r| self.dataset.record_id(r).cloned())
            .collect()
    }

    /// Projected row at a view position.
    pub fn get_row(&self, index: usize) -> Option<Record> {
        let row = self.dataset_row(index)?;
        let mut result = Record::with_capacity(self.columns.len());
        for column in &self.columns {
            result.insert(column.clone(), self.dataset.get_value(row, column)?);
        }
        Some(result)
    }

    /// Value of a projected column; `None` for columns outside the projection.
    pub fn get_value(&self, index: usize, column: &str) -> Option<ColumnValue> {
        if !self.columns.iter().any(|c| c == column) {
            return None;
        }
        self.dataset.get_value(self.dataset_row(index)?, column)
    }

    fn row_values(&self, row: usize) -> Vec<ColumnValue> {
        self.columns
            .iter()
            .map(|c| self.dataset.get_value(row, c).unwrap_or(ColumnValue::Null))
            .collect()
    }
}

impl Serialize for TableView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<ColumnValue>> = self.rows.iter().map(|&r| self.row_values(r)).collect();

        let mut state = serializer.serialize_struct("TableView", 3)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("count", &self.rows.len())?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}

/// One plotted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: RecordId,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<f64>,
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// `None` for fewer than two points or when every `x` is equal.
    pub fn fit<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let points: Vec<(f64, f64)> = points.into_iter().collect();
        if points.len() < 2 {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

        if sxx == 0.0 || !sxx.is_finite() {
            return None;
        }

        let slope = sxy / sxx;
        Some(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// End points of the fitted line over `[lo, hi]`.
    pub fn line_points(&self, lo: f64, hi: f64) -> [(f64, f64); 2] {
        [(lo, self.predict(lo)), (hi, self.predict(hi))]
    }
}

/// Scatter plot of two numeric fields, optionally coloured by a third.
/// Records missing any plotted field are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    x_field: String,
    y_field: String,
    color_field: Option<String>,
    points: Vec<ScatterPoint>,
}

impl ScatterView {
    pub fn new(
        dataset: &Dataset,
        selection: &Selection,
        x_field: &str,
        y_field: &str,
        color_field: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let x_col = dataset.require_numeric_column(x_field)?;
        let y_col = dataset.require_numeric_column(y_field)?;
        let color_col = color_field
            .map(|f| dataset.require_numeric_column(f))
            .transpose()?;

        let mut points = Vec::with_capacity(selection.len());
        for row in selection.iter() {
            let (Some(x), Some(y)) = (x_col.get_f64(row), y_col.get_f64(row)) else {
                continue;
            };
            let color = match color_col {
                Some(col) => match col.get_f64(row) {
                    Some(c) => Some(c),
                    None => continue,
                },
                None => None,
            };
            let Some(id) = dataset.record_id(row) else {
                continue;
            };
            points.push(ScatterPoint {
                id: id.clone(),
                x,
                y,
                color,
            });
        }

        Ok(ScatterView {
            x_field: x_field.to_string(),
            y_field: y_field.to_string(),
            color_field: color_field.map(String::from),
            points,
        })
    }

    pub fn x_field(&self) -> &str {
        &self.x_field
    }

    pub fn y_field(&self) -> &str {
        &self.y_field
    }

    pub fn color_field(&self) -> Option<&str> {
        self.color_field.as_deref()
    }

    pub fn points(&self) -> &[ScatterPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest plotted `x`.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |range, p| match range {
            None => Some((p.x, p.x)),
            Some((lo, hi)) => Some((lo.min(p.x), hi.max(p.x))),
        })
    }

    /// Regression line through the plotted points.
    pub fn linear_fit(&self) -> Option<LinearFit> {
        LinearFit::fit(self.points.iter().map(|p| (p.x, p.y)))
    }
}

/// One record of the detail tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub id: RecordId,
    pub values: Vec<ColumnValue>,
}

/// Selected records projected onto the model-portfolio header fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    fields: Vec<String>,
    rows: Vec<DetailRow>,
}

impl DetailView {
    pub fn new(
        dataset: &Dataset,
        selection: &Selection,
        fields: &[String],
    ) -> Result<Self, SchemaError> {
        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            columns.push(dataset.require_column(field)?);
        }

        let rows = selection
            .iter()
            .filter_map(|row| {
                let id = dataset.record_id(row)?.clone();
                let values = columns
                    .iter()
                    .map(|col| col.get(row).unwrap_or(ColumnValue::Null))
                    .collect();
                Some(DetailRow { id, values })
            })
            .collect();

        Ok(DetailView {
            fields: fields.to_vec(),
            rows,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[DetailRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers in selection order, as saved to a model portfolio.
    pub fn tickers(&self) -> Vec<RecordId> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&DetailRow> {
        self.rows.iter().find(|r| r.id.as_str() == id)
    }

    pub fn value(&self, id: &str, field: &str) -> Option<&ColumnValue> {
        let index = self.fields.iter().position(|f| f == field)?;
        self.get(id)?.values.get(index)
    }
}
