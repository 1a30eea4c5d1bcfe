/// Selection state shared by linked views
///
/// A `Selection` is the subset of the loaded dataset that the table, scatter
/// plot and detail tab currently show. It is always derived from scratch from
/// three kinds of input:
///
/// - `Filters`: per-field membership sets (the multi-selects above the table),
///   combined with logical AND;
/// - `Brush`: a rectangle drawn on the scatter plot, restricting two numeric
///   fields to open intervals;
/// - an explicit pick: identifiers chosen directly (table row click, heatmap
///   cell click), which bypasses filters and brush.
///
/// `SelectionCoordinator` holds the current dataset and the latest inputs and
/// recomputes the selection whenever one of them changes. Nothing is cached,
/// so a view can never observe a selection from an older dataset.

use crate::column::{Column, ColumnValue};
use crate::dataset::{Dataset, Record, RecordId};
use crate::error::SelectionError;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Per-field membership filters. A field without an entry is unconstrained.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::Filters;
///
/// let filters = Filters::new()
///     .allow("Country", ["Italy", "Spain"])
///     .allow("Industry", ["Utilities"]);
///
/// assert_eq!(filters.len(), 2);
/// assert!(!filters.is_unconstrained());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filters {
    fields: BTreeMap<String, Vec<ColumnValue>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `set`.
    pub fn allow<F, I>(mut self, field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator,
        I::Item: Into<ColumnValue>,
    {
        self.set(field, values.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the allowed values of one field.
    pub fn set(&mut self, field: impl Into<String>, values: Vec<ColumnValue>) {
        self.fields.insert(field.into(), values);
    }

    /// Lift the constraint on one field.
    pub fn remove(&mut self, field: &str) -> Option<Vec<ColumnValue>> {
        self.fields.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&[ColumnValue]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when no field is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Open interval `(lo, hi)` over one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRange {
    pub field: String,
    pub lo: f64,
    pub hi: f64,
}

impl AxisRange {
    pub fn new(field: impl Into<String>, lo: f64, hi: f64) -> Self {
        AxisRange {
            field: field.into(),
            lo,
            hi,
        }
    }

    /// Empty, inverted or NaN ranges contain nothing.
    pub fn is_empty(&self) -> bool {
        !(self.lo < self.hi)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lo < value && value < self.hi
    }
}

/// Rectangle brushed on the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Brush {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl Brush {
    pub fn new(x: AxisRange, y: AxisRange) -> Self {
        Brush { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

/// Sorted, de-duplicated row positions into the dataset the selection was
/// computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    rows: Vec<usize>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every record of `dataset`.
    pub fn all(dataset: &Dataset) -> Self {
        Selection {
            rows: (0..dataset.len()).collect(),
        }
    }

    pub fn from_rows(mut rows: Vec<usize>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Selection { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().copied()
    }

    /// Identifiers of the selected records, in row order.
    pub fn ids(&self, dataset: &Dataset) -> Vec<RecordId> {
        self.rows
            .iter()
            .filter_map(|&row| dataset.record_id(row).cloned())
            .collect()
    }

    pub fn records(&self, dataset: &Dataset) -> Vec<Record> {
        self.rows.iter().filter_map(|&row| dataset.get_row(row)).collect()
    }
}

fn numeric_column<'a>(dataset: &'a Dataset, field: &str) -> Result<&'a Column, SelectionError> {
    let column = dataset
        .column(field)
        .ok_or_else(|| SelectionError::FieldNotFound(field.to_string()))?;
    if !column.column_type().is_numeric() {
        return Err(SelectionError::NotNumeric {
            field: field.to_string(),
            found: column.column_type(),
        });
    }
    Ok(column)
}

fn is_member(column: &Column, row: usize, allowed: &[ColumnValue]) -> bool {
    if let Some(s) = column.get_str(row) {
        return allowed.iter().any(|a| a.as_string() == Some(s));
    }
    let value = column.get(row).unwrap_or(ColumnValue::Null);
    allowed.iter().any(|a| a.same_value(&value))
}

/// Records satisfying every field filter.
///
/// The result replaces any previous filtered subset: only the fields in
/// `filters` constrain it. An empty dataset yields an empty selection.
pub fn apply_filters(dataset: &Dataset, filters: &Filters) -> Result<Selection, SelectionError> {
    if dataset.is_empty() {
        return Ok(Selection::empty());
    }

    let mut predicates = Vec::with_capacity(filters.len());
    for (field, allowed) in &filters.fields {
        let column = dataset
            .column(field)
            .ok_or_else(|| SelectionError::FieldNotFound(field.clone()))?;
        predicates.push((column, allowed.as_slice()));
    }

    let rows: Vec<usize> = (0..dataset.len())
        .filter(|&row| {
            predicates
                .iter()
                .all(|(column, allowed)| is_member(column, row, allowed))
        })
        .collect();

    debug!(
        "{}: {} of {} records pass {} filter(s)",
        dataset.name(),
        rows.len(),
        dataset.len(),
        filters.len()
    );
    Ok(Selection { rows })
}

/// Restrict `selection` (or the whole dataset when `None`) to records whose
/// brushed fields both lie strictly inside the brush ranges.
pub fn apply_brush(
    dataset: &Dataset,
    selection: Option<&Selection>,
    brush: &Brush,
) -> Result<Selection, SelectionError> {
    if dataset.is_empty() {
        return Ok(Selection::empty());
    }

    let x_col = numeric_column(dataset, &brush.x.field)?;
    let y_col = numeric_column(dataset, &brush.y.field)?;

    if brush.is_empty() {
        return Ok(Selection::empty());
    }

    let inside = |row: usize| {
        matches!(x_col.get_f64(row), Some(x) if brush.x.contains(x))
            && matches!(y_col.get_f64(row), Some(y) if brush.y.contains(y))
    };

    let rows: Vec<usize> = match selection {
        Some(selection) => selection
            .iter()
            .filter(|&row| row < dataset.len() && inside(row))
            .collect(),
        None => (0..dataset.len()).filter(|&row| inside(row)).collect(),
    };

    debug!("{}: brush kept {} records", dataset.name(), rows.len());
    Ok(Selection { rows })
}

/// Select records by identifier. Identifiers not present in the dataset are
/// ignored.
pub fn apply_explicit(dataset: &Dataset, ids: &[RecordId]) -> Selection {
    Selection::from_rows(ids.iter().filter_map(|id| dataset.row_of(id.as_str())).collect())
}

/// Holds the loaded dataset and the latest filter, brush and pick inputs.
///
/// Input rules:
/// - `load` replaces the dataset and clears every input;
/// - setting filters or the brush clears an explicit pick;
/// - an explicit pick wins over filters and brush while it is set;
/// - an input naming an unknown field is rejected and leaves the previous
///   inputs in place.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::{ColumnType, ColumnValue, Dataset, Filters, Schema, SelectionCoordinator};
/// use std::collections::HashMap;
/// use std::rc::Rc;
///
/// let schema = Schema::new(vec![
///     ("ID".to_string(), ColumnType::String, false),
///     ("Country".to_string(), ColumnType::String, true),
/// ]);
/// let mut dataset = Dataset::new("bonds".to_string(), schema, "ID").unwrap();
/// for (id, country) in [("B1", "Italy"), ("B2", "Spain")] {
///     let mut row = HashMap::new();
///     row.insert("ID".to_string(), ColumnValue::from(id));
///     row.insert("Country".to_string(), ColumnValue::from(country));
///     dataset.append_row(row).unwrap();
/// }
///
/// let mut coordinator = SelectionCoordinator::new(Rc::new(dataset));
/// let selection = coordinator
///     .set_filters(Filters::new().allow("Country", ["Spain"]))
///     .unwrap();
/// assert_eq!(selection.ids(coordinator.dataset()), vec!["B2".into()]);
/// ```
pub struct SelectionCoordinator {
    dataset: Rc<Dataset>,
    generation: u64,
    filters: Filters,
    brush: Option<Brush>,
    pick: Option<Vec<RecordId>>,
}

impl SelectionCoordinator {
    pub fn new(dataset: Rc<Dataset>) -> Self {
        info!("{}: {} records loaded", dataset.name(), dataset.len());
        SelectionCoordinator {
            dataset,
            generation: 0,
            filters: Filters::new(),
            brush: None,
            pick: None,
        }
    }

    /// Replace the dataset wholesale. All inputs are discarded.
    pub fn load(&mut self, dataset: Rc<Dataset>) {
        info!("{}: {} records loaded", dataset.name(), dataset.len());
        self.dataset = dataset;
        self.generation += 1;
        self.filters = Filters::new();
        self.brush = None;
        self.pick = None;
    }

    pub fn dataset(&self) -> &Rc<Dataset> {
        &self.dataset
    }

    /// Number of times a dataset has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn brush(&self) -> Option<&Brush> {
        self.brush.as_ref()
    }

    pub fn pick(&self) -> Option<&[RecordId]> {
        self.pick.as_deref()
    }

    fn check_field(&self, field: &str) -> Result<(), SelectionError> {
        if self.dataset.is_empty() || self.dataset.schema().contains(field) {
            Ok(())
        } else {
            Err(SelectionError::FieldNotFound(field.to_string()))
        }
    }

    /// Replace the whole filter map.
    pub fn set_filters(&mut self, filters: Filters) -> Result<Selection, SelectionError> {
        for field in filters.fields() {
            self.check_field(field)?;
        }
        self.filters = filters;
        self.pick = None;
        self.selection()
    }

    /// Replace the allowed values of one field, keeping the other fields.
    pub fn set_field_filter(
        &mut self,
        field: &str,
        values: Vec<ColumnValue>,
    ) -> Result<Selection, SelectionError> {
        self.check_field(field)?;
        self.filters.set(field, values);
        self.pick = None;
        self.selection()
    }

    /// Lift the constraint on one field.
    pub fn reset_field(&mut self, field: &str) -> Result<Selection, SelectionError> {
        self.filters.remove(field);
        self.pick = None;
        self.selection()
    }

    pub fn set_brush(&mut self, brush: Brush) -> Result<Selection, SelectionError> {
        if !self.dataset.is_empty() {
            for field in [&brush.x.field, &brush.y.field] {
                numeric_column(&self.dataset, field)?;
            }
        }
        self.brush = Some(brush);
        self.pick = None;
        self.selection()
    }

    pub fn clear_brush(&mut self) -> Result<Selection, SelectionError> {
        self.brush = None;
        self.selection()
    }

    /// Select records directly, bypassing filters and brush.
    pub fn pick_ids(&mut self, ids: Vec<RecordId>) -> Selection {
        let selection = apply_explicit(&self.dataset, &ids);
        self.pick = Some(ids);
        selection
    }

    pub fn clear_pick(&mut self) -> Result<Selection, SelectionError> {
        self.pick = None;
        self.selection()
    }

    /// Filter-only subset: what the table shows before brushing.
    pub fn filtered(&self) -> Result<Selection, SelectionError> {
        apply_filters(&self.dataset, &self.filters)
    }

    /// Current selection, recomputed from the inputs.
    pub fn selection(&self) -> Result<Selection, SelectionError> {
        if let Some(ids) = &self.pick {
            return Ok(apply_explicit(&self.dataset, ids));
        }

        let filtered = self.filtered()?;
        match &self.brush {
            Some(brush) => apply_brush(&self.dataset, Some(&filtered), brush),
            None => Ok(filtered),
        }
    }

    /// Sorted distinct values offered by a filter control.
    pub fn filter_options(&self, field: &str) -> Result<Vec<ColumnValue>, SelectionError> {
        self.dataset
            .column(field)
            .map(|column| column.distinct_values())
            .ok_or_else(|| SelectionError::FieldNotFound(field.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::dataset::Schema;
    use std::collections::HashMap;

    /// Ten bonds B01..B10 with Yield 1..10; odd yields are country A.
    fn bonds() -> Dataset {
        let schema = Schema::new(vec![
            ("ID".to_string(), ColumnType::String, false),
            ("Country".to_string(), ColumnType::String, true),
            ("Industry".to_string(), ColumnType::String, true),
            ("Yield".to_string(), ColumnType::Float64, true),
            ("Spread".to_string(), ColumnType::Float64, true),
        ]);

        let mut dataset = Dataset::new("bonds".to_string(), schema, "ID").unwrap();
        for i in 1..=10 {
            let mut row = HashMap::new();
            row.insert("ID".to_string(), ColumnValue::from(format!("B{:02}", i)));
            row.insert(
                "Country".to_string(),
                ColumnValue::from(if i % 2 == 1 { "A" } else { "B" }),
            );
            row.insert(
                "Industry".to_string(),
                ColumnValue::from(if i <= 5 { "Energy" } else { "Financials" }),
            );
            row.insert("Yield".to_string(), ColumnValue::Float64(i as f64));
            row.insert(
                "Spread".to_string(),
                if i == 10 { ColumnValue::Null } else { ColumnValue::Float64(i as f64 * 10.0) },
            );
            dataset.append_row(row).unwrap();
        }
        dataset
    }

    fn ids(selection: &Selection, dataset: &Dataset) -> Vec<String> {
        selection.ids(dataset).iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_unconstrained_filters_select_everything() {
        let dataset = bonds();
        let selection = apply_filters(&dataset, &Filters::new()).unwrap();
        assert_eq!(selection, Selection::all(&dataset));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let dataset = bonds();
        let filters = Filters::new()
            .allow("Country", ["A"])
            .allow("Industry", ["Energy"]);

        let selection = apply_filters(&dataset, &filters).unwrap();
        assert_eq!(ids(&selection, &dataset), vec!["B01", "B03", "B05"]);
    }

    #[test]
    fn test_filters_idempotent() {
        let dataset = bonds();
        let filters = Filters::new().allow("Country", ["B"]);

        let first = apply_filters(&dataset, &filters).unwrap();
        let second = apply_filters(&dataset, &filters).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_filter_on_numeric_and_null_values() {
        let dataset = bonds();

        let by_yield = Filters::new().allow("Yield", [2, 4]);
        assert_eq!(ids(&apply_filters(&dataset, &by_yield).unwrap(), &dataset), vec!["B02", "B04"]);

        let mut null_spread = Filters::new();
        null_spread.set("Spread", vec![ColumnValue::Null]);
        assert_eq!(ids(&apply_filters(&dataset, &null_spread).unwrap(), &dataset), vec!["B10"]);
    }

    #[test]
    fn test_filter_unknown_field() {
        let dataset = bonds();
        let filters = Filters::new().allow("Rating", ["AA"]);
        assert_eq!(
            apply_filters(&dataset, &filters).unwrap_err(),
            SelectionError::FieldNotFound("Rating".to_string())
        );
    }

    #[test]
    fn test_empty_dataset_yields_empty_selection() {
        let schema = Schema::new(vec![("ID".to_string(), ColumnType::String, false)]);
        let dataset = Dataset::new("empty".to_string(), schema, "ID").unwrap();

        let filters = Filters::new().allow("Country", ["A"]);
        assert!(apply_filters(&dataset, &filters).unwrap().is_empty());

        let brush = Brush::new(AxisRange::new("Yield", 0.0, 1.0), AxisRange::new("Yield", 0.0, 1.0));
        assert!(apply_brush(&dataset, None, &brush).unwrap().is_empty());
    }

    #[test]
    fn test_filter_then_brush() {
        let dataset = bonds();
        let filtered = apply_filters(&dataset, &Filters::new().allow("Country", ["A"])).unwrap();
        let brush = Brush::new(AxisRange::new("Yield", 2.0, 5.0), AxisRange::new("Yield", 2.0, 5.0));

        let brushed = apply_brush(&dataset, Some(&filtered), &brush).unwrap();
        assert_eq!(ids(&brushed, &dataset), vec!["B03"]);
    }

    #[test]
    fn test_brush_bounds_are_exclusive_and_skip_missing() {
        let dataset = bonds();
        let brush = Brush::new(
            AxisRange::new("Yield", 2.0, 10.5),
            AxisRange::new("Spread", 20.0, 1000.0),
        );

        let brushed = apply_brush(&dataset, None, &brush).unwrap();
        // B02 sits on the Spread lower bound, B10 has no Spread.
        assert_eq!(
            ids(&brushed, &dataset),
            vec!["B03", "B04", "B05", "B06", "B07", "B08", "B09"]
        );
    }

    #[test]
    fn test_empty_and_inverted_brush() {
        let dataset = bonds();
        let flat = Brush::new(AxisRange::new("Yield", 3.0, 3.0), AxisRange::new("Spread", 0.0, 100.0));
        let inverted = Brush::new(AxisRange::new("Yield", 0.0, 100.0), AxisRange::new("Spread", 90.0, 10.0));

        assert!(apply_brush(&dataset, None, &flat).unwrap().is_empty());
        assert!(apply_brush(&dataset, None, &inverted).unwrap().is_empty());
    }

    #[test]
    fn test_brush_errors() {
        let dataset = bonds();
        let unknown = Brush::new(AxisRange::new("Duration", 0.0, 1.0), AxisRange::new("Yield", 0.0, 1.0));
        let textual = Brush::new(AxisRange::new("Yield", 0.0, 1.0), AxisRange::new("Country", 0.0, 1.0));

        assert_eq!(
            apply_brush(&dataset, None, &unknown).unwrap_err(),
            SelectionError::FieldNotFound("Duration".to_string())
        );
        assert!(matches!(
            apply_brush(&dataset, None, &textual).unwrap_err(),
            SelectionError::NotNumeric { ref field, .. } if field == "Country"
        ));
    }

    #[test]
    fn test_explicit_pick_ignores_unknown_ids() {
        let dataset = bonds();
        let picked = apply_explicit(
            &dataset,
            &["B07".into(), "ZZZ".into(), "B02".into(), "B07".into()],
        );
        assert_eq!(ids(&picked, &dataset), vec!["B02", "B07"]);
    }

    #[test]
    fn test_coordinator_filters_replace() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));

        let a = coordinator.set_filters(Filters::new().allow("Country", ["A"])).unwrap();
        assert_eq!(a.len(), 5);

        let energy = coordinator.set_filters(Filters::new().allow("Industry", ["Energy"])).unwrap();
        assert_eq!(energy.len(), 5);
        assert!(coordinator.filters().get("Country").is_none());
    }

    #[test]
    fn test_coordinator_field_filter_and_reset() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));

        coordinator.set_field_filter("Country", vec!["A".into()]).unwrap();
        let both = coordinator
            .set_field_filter("Industry", vec!["Financials".into()])
            .unwrap();
        assert_eq!(ids(&both, coordinator.dataset()), vec!["B07", "B09"]);

        let reset = coordinator.reset_field("Country").unwrap();
        assert_eq!(reset.len(), 5);
    }

    #[test]
    fn test_coordinator_brush_applies_to_filtered_subset() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));
        coordinator.set_filters(Filters::new().allow("Country", ["B"])).unwrap();

        let brushed = coordinator
            .set_brush(Brush::new(
                AxisRange::new("Yield", 1.0, 7.0),
                AxisRange::new("Spread", 0.0, 100.0),
            ))
            .unwrap();
        assert_eq!(ids(&brushed, coordinator.dataset()), vec!["B02", "B04", "B06"]);

        // The table subset ignores the brush.
        assert_eq!(coordinator.filtered().unwrap().len(), 5);

        let cleared = coordinator.clear_brush().unwrap();
        assert_eq!(cleared.len(), 5);
    }

    #[test]
    fn test_coordinator_pick_overrides_until_next_input() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));
        coordinator.set_filters(Filters::new().allow("Country", ["A"])).unwrap();

        let picked = coordinator.pick_ids(vec!["B02".into(), "B04".into()]);
        assert_eq!(picked.len(), 2);
        assert_eq!(coordinator.selection().unwrap(), picked);

        let refiltered = coordinator.set_field_filter("Industry", vec!["Energy".into()]).unwrap();
        assert!(coordinator.pick().is_none());
        assert_eq!(ids(&refiltered, coordinator.dataset()), vec!["B01", "B03", "B05"]);
    }

    #[test]
    fn test_coordinator_rejected_input_keeps_state() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));
        coordinator.set_filters(Filters::new().allow("Country", ["A"])).unwrap();

        let err = coordinator
            .set_filters(Filters::new().allow("Rating", ["AAA"]))
            .unwrap_err();
        assert_eq!(err, SelectionError::FieldNotFound("Rating".to_string()));
        assert_eq!(coordinator.filters().get("Country"), Some(&[ColumnValue::from("A")][..]));

        let err = coordinator
            .set_brush(Brush::new(AxisRange::new("Industry", 0.0, 1.0), AxisRange::new("Yield", 0.0, 1.0)))
            .unwrap_err();
        assert!(matches!(err, SelectionError::NotNumeric { .. }));
        assert!(coordinator.brush().is_none());
    }

    #[test]
    fn test_coordinator_load_clears_inputs() {
        let mut coordinator = SelectionCoordinator::new(Rc::new(bonds()));
        coordinator.set_filters(Filters::new().allow("Country", ["A"])).unwrap();
        coordinator.pick_ids(vec!["B01".into()]);

        let schema = Schema::new(vec![
            ("ID".to_string(), ColumnType::String, false),
            ("Sector".to_string(), ColumnType::String, true),
        ]);
        let mut fresh = Dataset::new("equities".to_string(), schema, "ID").unwrap();
        let mut row = HashMap::new();
        row.insert("ID".to_string(), ColumnValue::from("EQ1"));
        row.insert("Sector".to_string(), ColumnValue::from("Energy"));
        fresh.append_row(row).unwrap();

        coordinator.load(Rc::new(fresh));

        assert_eq!(coordinator.generation(), 1);
        assert!(coordinator.filters().is_unconstrained());
        assert!(coordinator.pick().is_none());
        assert_eq!(ids(&coordinator.selection().unwrap(), coordinator.dataset()), vec!["EQ1"]);
    }

    #[test]
    fn test_filter_options() {
        let coordinator = SelectionCoordinator::new(Rc::new(bonds()));
        assert_eq!(
            coordinator.filter_options("Industry").unwrap(),
            vec![ColumnValue::from("Energy"), ColumnValue::from("Financials")]
        );
        assert_eq!(
            coordinator.filter_options("Rating").unwrap_err(),
            SelectionError::FieldNotFound("Rating".to_string())
        );
    }

    #[test]
    fn test_brush_error_names_each_axis() {
        let dataset = bonds();
        let unknown_y = Brush::new(AxisRange::new("Yield", 0.0, 1.0), AxisRange::new("Rating", 0.0, 1.0));
        assert_eq!(
            apply_brush(&dataset, None, &unknown_y).unwrap_err(),
            SelectionError::FieldNotFound("Rating".to_string())
        );

        let textual_x = Brush::new(AxisRange::new("Industry", 0.0, 1.0), AxisRange::new("Yield", 0.0, 1.0));
        assert_eq!(
            apply_brush(&dataset, None, &textual_x).unwrap_err(),
            SelectionError::NotNumeric { field: "Industry".to_string(), found: ColumnType::String }
        );
    }
}
