use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::foundation::core::Frequency;

/// A parsed plot definition document.
///
/// `layout` and `config` are opaque to generation and forwarded into the output document as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotDef {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    #[serde(default)]
    pub datasets: Vec<DataSetDef>,
    #[serde(default)]
    pub computed: Vec<ComputedDef>,
    #[serde(default)]
    pub series: Vec<SeriesDef>,
    #[serde(default)]
    pub scalars: Vec<ScalarDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub layout: JsonValue,
    #[serde(default)]
    pub config: JsonValue,
    /// Echoed unchanged into the output document as `params`.
    #[serde(default)]
    pub parameters: BTreeMap<String, JsonValue>,
}

fn default_frequency() -> Frequency {
    Frequency::Daily
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSetDef {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub query: String,
}

/// A dataset derived from two others by a named join predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedDef {
    pub name: String,
    pub function: String,
    pub datasets: Vec<ComputeInputDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInputDef {
    pub dataset: String,
    pub join_field: String,
    pub value_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Vertical bars.
    Bar,
    /// Horizontal bars.
    Hbar,
    Line,
    /// Vertical box plot.
    Box,
    /// Horizontal box plot.
    Hbox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillKind {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "tozero")]
    ToZero,
}

/// Group value that fans a series out into one trace per distinct group field value.
pub const GROUP_WILDCARD: &str = "*";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDef {
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    /// Marker symbol for line series; empty draws lines only.
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub fill: FillKind,
    pub dataset: String,
    #[serde(default)]
    pub labels: String,
    pub values: String,
    #[serde(default)]
    pub groupfield: String,
    #[serde(default)]
    pub groupvalue: String,
    #[serde(default)]
    pub hovertemplate: String,
    #[serde(skip)]
    pub(crate) order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// Display the value as a number.
    Number,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    #[default]
    #[serde(rename = "")]
    None,
    /// Show the percentage change of the value relative to the delta reference.
    #[serde(rename = "relative")]
    Relative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarDef {
    #[serde(rename = "type")]
    pub kind: ScalarKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub dataset: String,
    pub value: String,
    #[serde(default)]
    pub value_suffix: String,
    #[serde(default)]
    pub value_prefix: String,
    #[serde(default)]
    pub delta_dataset: String,
    #[serde(default)]
    pub delta_value: String,
    #[serde(default)]
    pub delta_type: DeltaKind,
    #[serde(default)]
    pub increase_color: String,
    #[serde(default)]
    pub decrease_color: String,
    #[serde(skip)]
    pub(crate) order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Heatmap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDef {
    #[serde(rename = "type")]
    pub kind: TableKind,
    #[serde(default)]
    pub name: String,
    pub dataset: String,
    pub labels_x: String,
    pub labels_y: String,
    pub values: String,
    /// Forwarded into the heatmap trace unchanged.
    #[serde(default)]
    pub colorbar: JsonValue,
    #[serde(skip)]
    pub(crate) order: usize,
}
