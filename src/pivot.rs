/// Two-dimensional pivots and per-group summaries
///
/// The return heatmap aggregates one numeric field over two categorical
/// fields (e.g. amount outstanding by issue month × year). The detail tab
/// summarises selected securities per group with min / mean / max.

use crate::column::ColumnValue;
use crate::dataset::Dataset;
use crate::error::SchemaError;
use crate::selection::Selection;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How the values falling into one pivot cell are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
}

impl Aggregation {
    /// Combine `values`; `None` when there are none.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let result = match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Mean => values.iter().sum::<f64>() / n,
            Aggregation::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Count => n,
        };
        Some(result)
    }
}

impl FromStr for Aggregation {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" | "avg" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            _ => Err(SchemaError::UnknownAggregation(s.to_string())),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        };
        f.write_str(name)
    }
}

/// Which fields to pivot on and how to aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub rows: String,
    pub columns: String,
    pub values: String,
    pub aggregation: Aggregation,
}

impl PivotSpec {
    pub fn new(
        rows: impl Into<String>,
        columns: impl Into<String>,
        values: impl Into<String>,
        aggregation: Aggregation,
    ) -> Self {
        PivotSpec {
            rows: rows.into(),
            columns: columns.into(),
            values: values.into(),
            aggregation,
        }
    }
}

/// Aggregated values laid out by sorted row and column labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    spec: PivotSpec,
    row_labels: Vec<ColumnValue>,
    column_labels: Vec<ColumnValue>,
    cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn spec(&self) -> &PivotSpec {
        &self.spec
    }

    pub fn row_labels(&self) -> &[ColumnValue] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[ColumnValue] {
        &self.column_labels
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    pub fn get_by_labels(&self, row: &ColumnValue, column: &ColumnValue) -> Option<f64> {
        let r = self.row_labels.binary_search_by(|l| l.total_cmp(row)).ok()?;
        let c = self.column_labels.binary_search_by(|l| l.total_cmp(column)).ok()?;
        self.get(r, c)
    }
}

fn covered_rows(dataset: &Dataset, selection: Option<&Selection>) -> Vec<usize> {
    match selection {
        Some(selection) => selection.iter().filter(|&r| r < dataset.len()).collect(),
        None => (0..dataset.len()).collect(),
    }
}

fn sorted_labels(mut labels: Vec<ColumnValue>) -> Vec<ColumnValue> {
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup_by(|a, b| a.same_value(b));
    labels
}

/// Pivot `spec.values` over `spec.rows` × `spec.columns`.
///
/// Records missing a label or the value are skipped; labels only appear if
/// at least one value falls under them.
pub fn pivot(
    dataset: &Dataset,
    selection: Option<&Selection>,
    spec: &PivotSpec,
) -> Result<PivotTable, SchemaError> {
    let row_col = dataset.require_column(&spec.rows)?;
    let col_col = dataset.require_column(&spec.columns)?;
    let value_col = dataset.require_numeric_column(&spec.values)?;

    let entries: Vec<(ColumnValue, ColumnValue, f64)> = covered_rows(dataset, selection)
        .into_iter()
        .filter_map(|r| {
            let value = value_col.get_f64(r)?;
            let row = row_col.get(r).filter(|v| !v.is_null())?;
            let column = col_col.get(r).filter(|v| !v.is_null())?;
            Some((row, column, value))
        })
        .collect();

    let row_labels = sorted_labels(entries.iter().map(|e| e.0.clone()).collect());
    let column_labels = sorted_labels(entries.iter().map(|e| e.1.clone()).collect());

    let mut buckets = vec![vec![Vec::new(); column_labels.len()]; row_labels.len()];
    for (row, column, value) in &entries {
        let r = row_labels.binary_search_by(|l| l.total_cmp(row));
        let c = column_labels.binary_search_by(|l| l.total_cmp(column));
        if let (Ok(r), Ok(c)) = (r, c) {
            buckets[r][c].push(*value);
        }
    }

    let cells = buckets
        .iter()
        .map(|row| row.iter().map(|values| spec.aggregation.apply(values)).collect())
        .collect();

    debug!(
        "{}: pivot {} of '{}' by '{}' x '{}': {} x {}",
        dataset.name(),
        spec.aggregation,
        spec.values,
        spec.rows,
        spec.columns,
        row_labels.len(),
        column_labels.len()
    );

    Ok(PivotTable {
        spec: spec.clone(),
        row_labels,
        column_labels,
        cells,
    })
}

/// Min / mean / max of one metric within a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: usize,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Option<Self> {
        Some(MetricSummary {
            min: Aggregation::Min.apply(values)?,
            mean: Aggregation::Mean.apply(values)?,
            max: Aggregation::Max.apply(values)?,
            count: values.len(),
        })
    }
}

/// Per-metric summaries for one group. A metric with no values maps to `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: ColumnValue,
    pub metrics: BTreeMap<String, Option<MetricSummary>>,
}

impl GroupSummary {
    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)?.as_ref()
    }
}

/// Summaries per distinct value of `group_field`, in sorted group order.
pub fn group_summary(
    dataset: &Dataset,
    selection: Option<&Selection>,
    group_field: &str,
    metrics: &[String],
) -> Result<Vec<GroupSummary>, SchemaError> {
    let group_col = dataset.require_column(group_field)?;
    let mut metric_cols = Vec::with_capacity(metrics.len());
    for metric in metrics {
        metric_cols.push(dataset.require_numeric_column(metric)?);
    }

    let rows = covered_rows(dataset, selection);
    let groups = sorted_labels(
        rows.iter()
            .filter_map(|&r| group_col.get(r))
            .filter(|v| !v.is_null())
            .collect(),
    );

    let mut values = vec![vec![Vec::new(); metrics.len()]; groups.len()];
    for &r in &rows {
        let Some(group) = group_col.get(r).filter(|v| !v.is_null()) else {
            continue;
        };
        let Ok(g) = groups.binary_search_by(|l| l.total_cmp(&group)) else {
            continue;
        };
        for (m, col) in metric_cols.iter().enumerate() {
            if let Some(v) = col.get_f64(r) {
                values[g][m].push(v);
            }
        }
    }

    Ok(groups
        .into_iter()
        .zip(values)
        .map(|(group, per_metric)| GroupSummary {
            group,
            metrics: metrics
                .iter()
                .cloned()
                .zip(per_metric.iter().map(|v| MetricSummary::from_values(v)))
                .collect(),
        })
        .collect())
}
