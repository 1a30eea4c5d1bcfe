/// Portfolio Monitor - Bucketed matrices and linked-view selections
///
/// Core of a credit-portfolio dashboard: a dataset loaded from a query run is
/// bucketed into a category × quantile-band heatmap, and a selection shared
/// by the table, scatter plot, heatmap and detail tab is recomputed from
/// filter, brush and pick inputs whenever one of them changes.

pub mod column;
pub mod interner;
pub mod dataset;
pub mod error;
pub mod bucketizer;
pub mod selection;
pub mod view;
pub mod pivot;
pub mod prepare;
pub mod config;
pub mod console;

pub use column::{Column, ColumnType, ColumnValue};
pub use interner::{StringInterner, StringId};
pub use dataset::{Dataset, Record, RecordId, Schema};
pub use error::{ConfigError, DatasetError, SchemaError, SelectionError};
pub use bucketizer::{compute_matrix, compute_matrix_for, records_in_cell, Bin, Bucketizer, BucketizerOptions, Matrix};
pub use selection::{apply_brush, apply_explicit, apply_filters, AxisRange, Brush, Filters, Selection, SelectionCoordinator};
pub use view::{DetailView, LinearFit, ScatterPoint, ScatterView, SortKey, SortOrder, TableView};
pub use pivot::{group_summary, pivot, Aggregation, GroupSummary, MetricSummary, PivotSpec, PivotTable};
pub use config::{ControlSpec, DashboardConfig, ValueType};
pub use console::{ConsoleLog, ConsoleMessage, ConsoleOptions};
