use serde::Serialize;
use serde_json::Value as JsonValue;

/// One renderable chart primitive in the output document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar(BarTrace),
    /// Line series.
    Scatter(ScatterTrace),
    Box(BoxTrace),
    /// Scalar number display.
    Indicator(IndicatorTrace),
    Heatmap(HeatmapTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Self::Bar(t) => &t.name,
            Self::Scatter(t) => &t.name,
            Self::Box(t) => &t.name,
            Self::Indicator(t) => &t.name,
            Self::Heatmap(t) => &t.name,
        }
    }
}

/// Marker styling shared by bar, line and box traces.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Marker {
    pub(crate) fn colored(color: Option<String>) -> Option<Self> {
        color.map(|c| Self {
            color: Some(c),
            symbol: None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub orientation: Orientation,
    pub x: Vec<JsonValue>,
    pub y: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub x: Vec<JsonValue>,
    pub y: Vec<JsonValue>,
    /// `lines` or `lines+markers`.
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    pub marker: Marker,
}

/// Box plot; exactly one of `x` (horizontal) and `y` (vertical) is set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxTrace {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorTrace {
    pub name: String,
    /// `number` or `number+delta`.
    pub mode: String,
    pub value: f64,
    pub number: IndicatorNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<IndicatorDelta>,
    pub domain: IndicatorDomain,
    pub title: IndicatorTitle,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IndicatorNumber {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontColor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FontColor {
    pub color: String,
}

/// Change display against a reference value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorDelta {
    pub reference: f64,
    pub relative: bool,
    pub valueformat: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increasing: Option<FontColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decreasing: Option<FontColor>,
}

/// Horizontal slot `[i/n, (i+1)/n]` and grid column of scalar `i` of `n`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorDomain {
    pub column: usize,
    pub x: [f64; 2],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndicatorTitle {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapTrace {
    pub name: String,
    pub x: Vec<JsonValue>,
    pub y: Vec<JsonValue>,
    /// Dense `z[y][x]`, null where a cell has no value.
    pub z: Vec<Vec<JsonValue>>,
    pub colorscale: String,
    pub reversescale: bool,
    #[serde(skip_serializing_if = "JsonValue::is_null")]
    pub colorbar: JsonValue,
}

/// Text label placed over a heatmap cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub xref: String,
    pub yref: String,
    pub x: JsonValue,
    pub y: JsonValue,
    pub text: String,
    pub showarrow: bool,
}
