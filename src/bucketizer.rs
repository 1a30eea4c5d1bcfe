/// Quantile bucketing and category × bin count matrices
///
/// The heatmap on the monitor tab shows, for one categorical field (country,
/// industry, rating...) and one numeric field (yield, spread, duration...),
/// how many securities of each category fall into each quantile band of the
/// numeric field.
///
/// Bin edges come from the observed distribution:
///
/// 1. Quantiles at `k / quantiles` (`k = 1..=quantiles`) of the non-missing
///    numeric values, linearly interpolated between closest ranks.
/// 2. Each cut is rounded to `precision` decimals; the top cut is pushed up
///    one step when rounding left it below the maximum.
/// 3. The lower edge is `0`, or the minimum rounded down when values are
///    negative.
/// 4. Cuts not strictly above the previous edge are dropped.
///
/// Bins are half-open `[lo, hi)` except the last one, which is closed
/// `[lo, hi]`, so every non-missing value lands in exactly one bin.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::bucketizer::{bin_edges, BucketizerOptions};
///
/// let yields: Vec<f64> = (1..=10).map(f64::from).collect();
/// let edges = bin_edges(&yields, &BucketizerOptions::default());
///
/// assert_eq!(edges.first(), Some(&0.0));
/// assert_eq!(edges.last(), Some(&10.0));
/// assert_eq!(edges.len(), 11);
/// ```

use crate::column::ColumnValue;
use crate::dataset::{Dataset, RecordId};
use crate::error::SchemaError;
use crate::selection::{Filters, Selection};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Largest number of decimals a cut point is rounded to.
pub const MAX_PRECISION: u32 = 15;

/// Number of quantiles and rounding of the cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketizerOptions {
    pub quantiles: usize,
    /// Decimal places kept on each cut point
    pub precision: u32,
}

impl BucketizerOptions {
    /// `precision` capped at `MAX_PRECISION`.
    pub fn effective_precision(&self) -> u32 {
        self.precision.min(MAX_PRECISION)
    }
}

impl Default for BucketizerOptions {
    fn default() -> Self {
        BucketizerOptions {
            quantiles: 10,
            precision: 1,
        }
    }
}

/// Numeric interval `[lo, hi)`, or `[lo, hi]` when `closed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub closed: bool,
}

impl Bin {
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && (value < self.hi || (self.closed && value <= self.hi))
    }

    /// Column label shown on the heatmap, e.g. `"2.8-3.7"`.
    pub fn label(&self, precision: u32) -> String {
        let p = precision as usize;
        format!("{:.*}-{:.*}", p, self.lo, p, self.hi)
    }
}

/// Quantile `q` (0..=1) of ascending `sorted` values, linear interpolation
/// between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

/// Strictly increasing bin edges for `values`. Non-finite values are
/// ignored; no finite value yields no edges.
pub fn bin_edges(values: &[f64], options: &BucketizerOptions) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let scale = 10f64.powi(options.effective_precision() as i32);
    let step = 1.0 / scale;
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    let lower = if min < 0.0 {
        ((min * scale).floor() / scale).min(min)
    } else {
        0.0
    };

    let quantiles = options.quantiles.max(1);
    let mut edges = Vec::with_capacity(quantiles + 1);
    edges.push(lower);

    for k in 1..=quantiles {
        let raw = quantile(&sorted, k as f64 / quantiles as f64).unwrap_or(max);
        let mut cut = round_to(raw, scale);
        if k == quantiles && cut < max {
            cut += step;
        }

        if edges.last().map_or(true, |&prev| cut > prev) {
            edges.push(cut);
        }
    }

    if edges.len() == 1 {
        edges.push(lower + step);
    }

    edges
}

/// Consecutive edge pairs as bins, the last one closed.
pub fn bins_from_edges(edges: &[f64]) -> Vec<Bin> {
    let count = edges.len().saturating_sub(1);
    edges
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Bin {
            lo: pair[0],
            hi: pair[1],
            closed: i + 1 == count,
        })
        .collect()
}

/// Position of the bin containing `value`.
pub fn bin_index(bins: &[Bin], value: f64) -> Option<usize> {
    let first = bins.first()?;
    if !value.is_finite() || value < first.lo {
        return None;
    }

    let i = bins.partition_point(|b| b.hi <= value);
    if i < bins.len() {
        return Some(i);
    }

    let last = bins.len() - 1;
    bins[last].contains(value).then_some(last)
}

/// Category × bin record counts. Zero cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    categorical_field: String,
    numeric_field: String,
    precision: u32,
    rows: Vec<ColumnValue>,
    bins: Vec<Bin>,
    cells: Vec<Vec<Option<u32>>>,
}

impl Matrix {
    pub fn categorical_field(&self) -> &str {
        &self.categorical_field
    }

    pub fn numeric_field(&self) -> &str {
        &self.numeric_field
    }

    /// Sorted distinct category labels.
    pub fn rows(&self) -> &[ColumnValue] {
        &self.rows
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn cells(&self) -> &[Vec<Option<u32>>] {
        &self.cells
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, bin: usize) -> Option<u32> {
        self.cells.get(row)?.get(bin).copied().flatten()
    }

    pub fn row_total(&self, row: usize) -> u32 {
        self.cells
            .get(row)
            .map_or(0, |cells| cells.iter().flatten().sum())
    }

    /// Number of records counted in the matrix.
    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .flat_map(|cells| cells.iter().flatten())
            .map(|&n| n as u64)
            .sum()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.bins.iter().map(|b| b.label(self.precision)).collect()
    }

    pub fn row_index(&self, label: &ColumnValue) -> Option<usize> {
        self.rows.binary_search_by(|r| r.total_cmp(label)).ok()
    }

    pub fn bin_index_for_label(&self, label: &str) -> Option<usize> {
        self.bins.iter().position(|b| b.label(self.precision) == label)
    }

    /// Hover lookup by row label and column label.
    pub fn cell_at_labels(&self, row_label: &ColumnValue, column_label: &str) -> Option<u32> {
        let row = self.row_index(row_label)?;
        let bin = self.bin_index_for_label(column_label)?;
        self.get(row, bin)
    }

    /// Filters restricting the categorical field to one row's label.
    pub fn row_filter(&self, row: usize) -> Option<Filters> {
        let label = self.rows.get(row)?;
        Some(Filters::new().allow(self.categorical_field.clone(), [label.clone()]))
    }
}

/// Builds matrices with fixed options.
#[derive(Debug, Clone, Default)]
pub struct Bucketizer {
    options: BucketizerOptions,
}

impl Bucketizer {
    /// Options with a `precision` above `MAX_PRECISION` are capped.
    pub fn new(mut options: BucketizerOptions) -> Self {
        if options.precision > MAX_PRECISION {
            warn!(
                "bucketizer precision {} capped at {}",
                options.precision, MAX_PRECISION
            );
            options.precision = MAX_PRECISION;
        }
        Bucketizer { options }
    }

    pub fn options(&self) -> &BucketizerOptions {
        &self.options
    }

    /// Matrix over every record of `dataset`.
    pub fn compute(
        &self,
        dataset: &Dataset,
        categorical_field: &str,
        numeric_field: &str,
    ) -> Result<Matrix, SchemaError> {
        self.build(dataset, None, categorical_field, numeric_field)
    }

    /// Matrix over the records of `selection`; edges follow their distribution.
    pub fn compute_for(
        &self,
        dataset: &Dataset,
        selection: &Selection,
        categorical_field: &str,
        numeric_field: &str,
    ) -> Result<Matrix, SchemaError> {
        self.build(dataset, Some(selection), categorical_field, numeric_field)
    }

    fn build(
        &self,
        dataset: &Dataset,
        selection: Option<&Selection>,
        categorical_field: &str,
        numeric_field: &str,
    ) -> Result<Matrix, SchemaError> {
        let cat_col = dataset.require_column(categorical_field)?;
        let num_col = dataset.require_numeric_column(numeric_field)?;
        let covered = covered_rows(dataset, selection);

        let values: Vec<f64> = covered.iter().filter_map(|&r| num_col.get_f64(r)).collect();
        let edges = bin_edges(&values, &self.options);
        let bins = bins_from_edges(&edges);

        if values.is_empty() {
            warn!(
                "{}: no values for '{}', matrix has no bins",
                dataset.name(),
                numeric_field
            );
        } else if bins.len() < self.options.quantiles {
            warn!(
                "{}: '{}' yields {} distinct cut points for {} quantiles",
                dataset.name(),
                numeric_field,
                bins.len(),
                self.options.quantiles
            );
        }

        let mut rows: Vec<ColumnValue> = covered
            .iter()
            .filter_map(|&r| cat_col.get(r))
            .filter(|v| !v.is_null())
            .collect();
        rows.sort_by(|a, b| a.total_cmp(b));
        rows.dedup_by(|a, b| a.same_value(b));

        let mut counts = vec![vec![0u32; bins.len()]; rows.len()];
        for &r in &covered {
            let Some(bin) = num_col.get_f64(r).and_then(|x| bin_index(&bins, x)) else {
                continue;
            };
            let Some(label) = cat_col.get(r).filter(|v| !v.is_null()) else {
                continue;
            };
            if let Ok(row) = rows.binary_search_by(|l| l.total_cmp(&label)) {
                counts[row][bin] += 1;
            }
        }

        let cells: Vec<Vec<Option<u32>>> = counts
            .into_iter()
            .map(|row| row.into_iter().map(|n| (n > 0).then_some(n)).collect())
            .collect();

        debug!(
            "{}: matrix '{}' x '{}' over {} records: {} rows, {} bins",
            dataset.name(),
            categorical_field,
            numeric_field,
            covered.len(),
            rows.len(),
            bins.len()
        );

        Ok(Matrix {
            categorical_field: categorical_field.to_string(),
            numeric_field: numeric_field.to_string(),
            precision: self.options.precision,
            rows,
            bins,
            cells,
        })
    }
}

fn covered_rows(dataset: &Dataset, selection: Option<&Selection>) -> Vec<usize> {
    match selection {
        Some(selection) => selection.iter().filter(|&r| r < dataset.len()).collect(),
        None => (0..dataset.len()).collect(),
    }
}

/// Matrix with default options (deciles, one decimal).
pub fn compute_matrix(
    dataset: &Dataset,
    categorical_field: &str,
    numeric_field: &str,
) -> Result<Matrix, SchemaError> {
    Bucketizer::default().compute(dataset, categorical_field, numeric_field)
}

pub fn compute_matrix_for(
    dataset: &Dataset,
    selection: &Selection,
    categorical_field: &str,
    numeric_field: &str,
) -> Result<Matrix, SchemaError> {
    Bucketizer::default().compute_for(dataset, selection, categorical_field, numeric_field)
}

/// Identifiers of the records counted in one cell, for a heatmap click.
///
/// Pass the same `selection` the matrix was computed over. Out-of-range
/// cells yield no identifiers.
pub fn records_in_cell(
    dataset: &Dataset,
    selection: Option<&Selection>,
    matrix: &Matrix,
    row: usize,
    bin: usize,
) -> Result<Vec<RecordId>, SchemaError> {
    let cat_col = dataset.require_column(&matrix.categorical_field)?;
    let num_col = dataset.require_numeric_column(&matrix.numeric_field)?;

    let Some(label) = matrix.rows.get(row) else {
        return Ok(Vec::new());
    };
    if bin >= matrix.bins.len() {
        return Ok(Vec::new());
    }

    Ok(covered_rows(dataset, selection)
        .into_iter()
        .filter(|&r| {
            num_col.get_f64(r).and_then(|x| bin_index(&matrix.bins, x)) == Some(bin)
                && cat_col.get(r).map_or(false, |v| v.same_value(label))
        })
        .filter_map(|r| dataset.record_id(r).cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::dataset::Schema;
    use std::collections::HashMap;

    fn dataset(rows: &[(&str, Option<&str>, Option<f64>)]) -> Dataset {
        let schema = Schema::new(vec![
            ("ID".to_string(), ColumnType::String, false),
            ("Country".to_string(), ColumnType::String, true),
            ("Yield".to_string(), ColumnType::Float64, true),
        ]);

        let mut dataset = Dataset::new("bonds".to_string(), schema, "ID").unwrap();
        for (id, country, yld) in rows {
            let mut row = HashMap::new();
            row.insert("ID".to_string(), ColumnValue::from(*id));
            row.insert(
                "Country".to_string(),
                country.map_or(ColumnValue::Null, ColumnValue::from),
            );
            row.insert(
                "Yield".to_string(),
                yld.map_or(ColumnValue::Null, ColumnValue::Float64),
            );
            dataset.append_row(row).unwrap();
        }
        dataset
    }

    /// B01..B10, Yield 1..10, odd yields in country A.
    fn ten_bonds() -> Dataset {
        let ids: Vec<String> = (1..=10).map(|i| format!("B{:02}", i)).collect();
        let rows: Vec<(&str, Option<&str>, Option<f64>)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let country = if i % 2 == 0 { "A" } else { "B" };
                (id.as_str(), Some(country), Some((i + 1) as f64))
            })
            .collect();
        dataset(&rows)
    }

    fn assert_edges(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "edges {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "edges {:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_decile_edges() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let edges = bin_edges(&values, &BucketizerOptions::default());
        assert_edges(
            &edges,
            &[0.0, 1.9, 2.8, 3.7, 4.6, 5.5, 6.4, 7.3, 8.2, 9.1, 10.0],
        );
    }

    #[test]
    fn test_top_edge_covers_maximum() {
        let edges = bin_edges(&[0.5, 1.04], &BucketizerOptions { quantiles: 2, precision: 1 });
        assert!(*edges.last().unwrap() >= 1.04);
    }

    #[test]
    fn test_degenerate_edges() {
        let options = BucketizerOptions::default();
        assert_edges(&bin_edges(&[5.0; 7], &options), &[0.0, 5.0]);
        assert_edges(&bin_edges(&[0.0; 3], &options), &[0.0, 0.1]);
        assert!(bin_edges(&[], &options).is_empty());
        assert!(bin_edges(&[f64::NAN], &options).is_empty());
    }

    #[test]
    fn test_excessive_precision_is_capped() {
        let values = [1.0, 2.0, 3.0];
        let edges = bin_edges(&values, &BucketizerOptions { quantiles: 10, precision: 400 });

        assert!(edges.iter().all(|e| e.is_finite()));
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        let bins = bins_from_edges(&edges);
        assert!(values.iter().all(|&v| bin_index(&bins, v).is_some()));

        let bucketizer = Bucketizer::new(BucketizerOptions { quantiles: 10, precision: 400 });
        assert_eq!(bucketizer.options().precision, MAX_PRECISION);
        let matrix = bucketizer.compute(&ten_bonds(), "Country", "Yield").unwrap();
        assert_eq!(matrix.total(), 10);
    }

    #[test]
    fn test_negative_values_lower_edge() {
        let edges = bin_edges(&[-2.35, 1.0, 3.0], &BucketizerOptions::default());
        assert!((edges[0] - (-2.4)).abs() < 1e-9);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bin_index_boundaries() {
        let bins = bins_from_edges(&[0.0, 1.0, 2.0]);
        assert_eq!(bin_index(&bins, 0.0), Some(0));
        assert_eq!(bin_index(&bins, 1.0), Some(1));
        assert_eq!(bin_index(&bins, 2.0), Some(1));
        assert_eq!(bin_index(&bins, 2.5), None);
        assert_eq!(bin_index(&bins, -0.1), None);
        assert_eq!(bin_index(&[], 1.0), None);
    }

    #[test]
    fn test_matrix_ten_bonds() {
        let dataset = ten_bonds();
        let matrix = compute_matrix(&dataset, "Country", "Yield").unwrap();

        assert_eq!(matrix.rows(), &[ColumnValue::from("A"), ColumnValue::from("B")]);
        assert!(matrix.n_bins() <= 10);
        assert_eq!(matrix.row_total(0), 5);
        assert_eq!(matrix.row_total(1), 5);

        // Country A holds the odd yields: bins 0, 2, 4, 6, 8.
        assert_eq!(matrix.get(0, 0), Some(1));
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(1, 9), Some(1));
        assert_eq!(matrix.column_labels()[0], "0.0-1.9");
        assert_eq!(matrix.column_labels()[9], "9.1-10.0");
    }

    #[test]
    fn test_cell_sum_excludes_missing() {
        let dataset = dataset(&[
            ("X1", Some("Italy"), Some(2.0)),
            ("X2", Some("Italy"), None),
            ("X3", None, Some(4.0)),
            ("X4", Some("Spain"), Some(4.0)),
            ("X5", Some("Spain"), Some(f64::NAN)),
        ]);

        let matrix = compute_matrix(&dataset, "Country", "Yield").unwrap();
        assert_eq!(matrix.rows(), &[ColumnValue::from("Italy"), ColumnValue::from("Spain")]);
        assert_eq!(matrix.total(), 2);
    }

    #[test]
    fn test_single_value_single_bin() {
        let dataset = dataset(&[
            ("X1", Some("Italy"), Some(5.0)),
            ("X2", Some("Spain"), Some(5.0)),
            ("X3", Some("Spain"), Some(5.0)),
        ]);

        let matrix = compute_matrix(&dataset, "Country", "Yield").unwrap();
        assert_eq!(matrix.n_bins(), 1);
        assert_eq!(matrix.row_total(0), 1);
        assert_eq!(matrix.row_total(1), 2);
    }

    #[test]
    fn test_single_category() {
        let dataset = dataset(&[
            ("X1", Some("Italy"), Some(1.0)),
            ("X2", Some("Italy"), Some(2.0)),
            ("X3", Some("Italy"), Some(3.0)),
        ]);

        let matrix = compute_matrix(&dataset, "Country", "Yield").unwrap();
        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.row_total(0), 3);
    }

    #[test]
    fn test_empty_dataset_empty_matrix() {
        let matrix = compute_matrix(&dataset(&[]), "Country", "Yield").unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.n_bins(), 0);
        assert_eq!(matrix.total(), 0);
    }

    #[test]
    fn test_schema_errors() {
        let dataset = ten_bonds();
        assert_eq!(
            compute_matrix(&dataset, "Rating", "Yield").unwrap_err(),
            SchemaError::MissingField("Rating".to_string())
        );
        assert!(matches!(
            compute_matrix(&dataset, "Yield", "Country").unwrap_err(),
            SchemaError::NotNumeric { .. }
        ));
    }

    #[test]
    fn test_label_lookup() {
        let matrix = compute_matrix(&ten_bonds(), "Country", "Yield").unwrap();
        assert_eq!(matrix.cell_at_labels(&ColumnValue::from("A"), "2.8-3.7"), Some(1));
        assert_eq!(matrix.cell_at_labels(&ColumnValue::from("B"), "2.8-3.7"), None);
        assert_eq!(matrix.cell_at_labels(&ColumnValue::from("C"), "2.8-3.7"), None);
        assert_eq!(matrix.bin_index_for_label("9.9-11.0"), None);
    }

    #[test]
    fn test_records_in_cell() {
        let dataset = ten_bonds();
        let matrix = compute_matrix(&dataset, "Country", "Yield").unwrap();

        let ids = records_in_cell(&dataset, None, &matrix, 0, 2).unwrap();
        assert_eq!(ids, vec![RecordId::from("B03")]);
        assert!(records_in_cell(&dataset, None, &matrix, 1, 2).unwrap().is_empty());
        assert!(records_in_cell(&dataset, None, &matrix, 5, 0).unwrap().is_empty());
    }

    #[test]
    fn test_row_filter() {
        let matrix = compute_matrix(&ten_bonds(), "Country", "Yield").unwrap();
        let filters = matrix.row_filter(1).unwrap();
        assert_eq!(filters.get("Country"), Some(&[ColumnValue::from("B")][..]));
        assert!(matrix.row_filter(2).is_none());
    }

    #[test]
    fn test_compute_for_selection() {
        let dataset = ten_bonds();
        let selection = Selection::from_rows(vec![0, 1, 2, 3]);

        let matrix = compute_matrix_for(&dataset, &selection, "Country", "Yield").unwrap();
        assert_eq!(matrix.total(), 4);
        assert_eq!(*matrix.bins().last().map(|b| &b.hi).unwrap(), 4.0);

        let ids = records_in_cell(&dataset, Some(&selection), &matrix, 1, matrix.n_bins() - 1).unwrap();
        assert_eq!(ids, vec![RecordId::from("B04")]);
    }

    #[test]
    fn test_custom_options() {
        let bucketizer = Bucketizer::new(BucketizerOptions { quantiles: 4, precision: 0 });
        let matrix = bucketizer.compute(&ten_bonds(), "Country", "Yield").unwrap();

        assert!(matrix.n_bins() <= 4);
        assert_eq!(matrix.total(), 10);
        assert_eq!(matrix.column_labels()[0], "0-3");
    }
}
