/// Dashboard configuration
///
/// A JSON document lists, for each tab, which dataset fields feed each
/// control (filter multi-selects, axis dropdowns, table columns, detail
/// headers) and which of them is selected by default. It also carries the
/// bucketizer and console options.
///
/// ```json
/// {
///   "controls": [
///     {"tab": "Monitor", "control_name": "x_axis", "field_name": "Duration", "value_type": "numerical", "default": "y"},
///     {"tab": "Monitor", "control_name": "x_axis", "field_name": "Yield", "value_type": "numerical"},
///     {"tab": "Monitor", "control_name": "filters", "field_name": "Country"}
///   ],
///   "bucketizer": {"quantiles": 10, "precision": 1},
///   "console": {"max_messages": 20}
/// }
/// ```

use crate::bucketizer::BucketizerOptions;
use crate::console::ConsoleOptions;
use crate::dataset::Schema;
use crate::error::{ConfigError, SchemaError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Kind of values a control offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[serde(alias = "numeric")]
    Numerical,
    #[default]
    Categorical,
}

/// One field offered by one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub tab: String,
    pub control_name: String,
    pub field_name: String,
    #[serde(default)]
    pub value_type: ValueType,
    /// Selected when the dashboard opens
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub default: bool,
}

/// Accepts `true`/`false` as well as the `"y"`/`"n"` markers of hand-edited sheets.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "true"),
        None => false,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub controls: Vec<ControlSpec>,
    pub bucketizer: BucketizerOptions,
    pub console: ConsoleOptions,
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Controls of one tab, in file order.
    pub fn controls_for(&self, tab: &str) -> Vec<&ControlSpec> {
        self.controls.iter().filter(|c| c.tab == tab).collect()
    }

    fn offered(&self, tab: &str, control: &str) -> Vec<&ControlSpec> {
        self.controls
            .iter()
            .filter(|c| c.tab == tab && c.control_name == control)
            .collect()
    }

    /// Fields offered by a control, in file order.
    pub fn fields_for(&self, tab: &str, control: &str) -> Vec<&str> {
        self.offered(tab, control)
            .into_iter()
            .map(|c| c.field_name.as_str())
            .collect()
    }

    /// Field selected by default: the first flagged one, else the first offered.
    pub fn default_for(&self, tab: &str, control: &str) -> Option<&str> {
        let offered = self.offered(tab, control);
        offered
            .iter()
            .find(|c| c.default)
            .or_else(|| offered.first())
            .map(|c| c.field_name.as_str())
    }

    /// Every field referenced by any control, first occurrence order.
    pub fn required_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for control in &self.controls {
            if !fields.contains(&control.field_name.as_str()) {
                fields.push(&control.field_name);
            }
        }
        fields
    }

    /// Referenced fields absent from `schema`.
    pub fn missing_fields(&self, schema: &Schema) -> Vec<&str> {
        self.required_fields()
            .into_iter()
            .filter(|f| !schema.contains(f))
            .collect()
    }

    /// Check that every referenced field exists and numerical controls point
    /// at numeric fields.
    pub fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        for control in &self.controls {
            match control.value_type {
                ValueType::Numerical => schema.require_numeric(&control.field_name)?,
                ValueType::Categorical => schema.require(&control.field_name)?,
            };
        }
        Ok(())
    }
}
