/// Portfolio Monitor CLI
///
/// Loads a JSON array of records, computes the heatmap matrix and the
/// selection for optional filters, and prints both as JSON.

use argh::FromArgs;
use portfolio_monitor::{
    apply_filters, Bucketizer, ColumnValue, DashboardConfig, Dataset, Filters, RecordId,
};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

/// Heatmap matrix and filtered selection for a JSON dataset
#[derive(FromArgs, Debug)]
struct Args {
    /// JSON file holding an array of records
    #[argh(positional)]
    dataset: PathBuf,

    /// identifier field of the records
    #[argh(positional)]
    id_field: String,

    /// categorical field giving the matrix rows
    #[argh(positional)]
    categorical: String,

    /// numeric field bucketed into the matrix columns
    #[argh(positional)]
    numeric: String,

    /// allowed value for a field, as field=value (repeatable)
    #[argh(option, short = 'f', from_str_fn(parse_filter))]
    filter: Vec<(String, String)>,

    /// dashboard configuration whose bucketizer options replace the defaults
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

fn parse_filter(arg: &str) -> Result<(String, String), String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("filter '{}' is not field=value", arg))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("filter '{}' has no field name", arg));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

/// Group filter pairs per field; values of numeric fields are read as numbers.
fn build_filters(dataset: &Dataset, pairs: &[(String, String)]) -> Filters {
    let mut filters = Filters::new();
    for (field, raw) in pairs {
        let numeric = dataset
            .schema()
            .get_column_type(field)
            .map_or(false, |t| t.is_numeric());
        let value = match raw.parse::<f64>() {
            Ok(v) if numeric => ColumnValue::Float64(v),
            _ => ColumnValue::from(raw.as_str()),
        };

        let mut values = filters.get(field).map(|v| v.to_vec()).unwrap_or_default();
        values.push(value);
        filters.set(field.as_str(), values);
    }
    filters
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let bucketizer = match &args.config {
        Some(path) => Bucketizer::new(DashboardConfig::from_path(path)?.bucketizer),
        None => Bucketizer::default(),
    };

    let name = args.dataset.display().to_string();
    let json = fs::read_to_string(&args.dataset)?;
    let dataset = Dataset::from_json_str(name.clone(), &json, &args.id_field)?;
    log::info!("{}: {} records", name, dataset.len());

    let filters = build_filters(&dataset, &args.filter);
    let selection = apply_filters(&dataset, &filters)?;
    let matrix = bucketizer.compute_for(&dataset, &selection, &args.categorical, &args.numeric)?;

    let ids: Vec<RecordId> = selection.ids(&dataset);
    let output = serde_json::json!({
        "matrix": matrix,
        "column_labels": matrix.column_labels(),
        "selection": ids,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Args = argh::from_env();
    if let Err(err) = run(args) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
