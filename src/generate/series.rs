use std::collections::{HashMap, HashSet};

use serde_json::Value as JsonValue;

use crate::data::dataset::check_iteration;
use crate::data::value::FieldValue;
use crate::definition::color::ColorTable;
use crate::definition::model::{FillKind, GROUP_WILDCARD, SeriesDef, SeriesKind};
use crate::foundation::error::PlotResult;
use crate::generate::DataSets;
use crate::generate::trace::{BarTrace, BoxTrace, Marker, Orientation, ScatterTrace, Trace};

/// Values accumulated for one display name while scanning a dataset.
struct LabeledSeries<'a> {
    name: String,
    def: &'a SeriesDef,
    labels: Vec<JsonValue>,
    values: Vec<JsonValue>,
}

/// Display name of the series a row belongs to, or `None` when a fixed group filter rejects it.
fn display_name(def: &SeriesDef, group: Option<&FieldValue>) -> Option<String> {
    let Some(group) = group else {
        return Some(def.name.clone());
    };
    let group = group.key_text();
    if def.groupvalue == GROUP_WILDCARD {
        if def.name.is_empty() {
            Some(group)
        } else {
            Some(format!("{}-{}", def.name, group))
        }
    } else if group == def.groupvalue {
        Some(def.name.clone())
    } else {
        None
    }
}

fn read_field(row: &dyn Fn(&str) -> FieldValue, field: &str) -> Result<FieldValue, String> {
    match row(field) {
        FieldValue::Error(e) => Err(format!("field {field:?}: {e}")),
        v => Ok(v),
    }
}

/// Display name, label and value contributed by the current row.
type Point = (String, Option<JsonValue>, JsonValue);

fn row_point(def: &SeriesDef, row: &dyn Fn(&str) -> FieldValue) -> Result<Option<Point>, String> {
    let group = if def.groupfield.is_empty() {
        None
    } else {
        Some(read_field(row, &def.groupfield)?)
    };
    let Some(name) = display_name(def, group.as_ref()) else {
        return Ok(None);
    };
    let label = if def.labels.is_empty() {
        None
    } else {
        Some(read_field(row, &def.labels)?.to_json())
    };
    let value = read_field(row, &def.values)?.to_json();
    Ok(Some((name, label, value)))
}

/// Build bar, line and box traces.
///
/// Every backing dataset is scanned once for all series that reference it. Traces come out
/// ordered by declaration, then by display name for series fanned out by a group field.
pub fn series_traces(
    datasets: &mut DataSets,
    defs: &[SeriesDef],
    colors: &ColorTable,
) -> PlotResult<Vec<Trace>> {
    let mut all: Vec<LabeledSeries<'_>> = Vec::new();

    for (dsname, series) in super::partition_by_dataset(defs, datasets, "series", |s| &s.dataset) {
        let Some(ds) = datasets.get_mut(dsname) else {
            continue;
        };

        let mut data: Vec<LabeledSeries<'_>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut skipped: HashSet<usize> = HashSet::new();

        tracing::info!(dataset = dsname, "reading dataset");
        ds.reset();
        let mut rowcount = 0usize;
        while ds.next() {
            rowcount += 1;
            let row = |f: &str| ds.field(f);
            for &def in &series {
                if skipped.contains(&def.order) {
                    continue;
                }
                let point = row_point(def, &row);
                let (name, label, value) = match point {
                    Ok(Some(p)) => p,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(
                            dataset = dsname,
                            series = %def.name,
                            "skipping series, {e}"
                        );
                        skipped.insert(def.order);
                        continue;
                    }
                };

                let idx = *index.entry(name.clone()).or_insert_with(|| {
                    tracing::debug!(dataset = dsname, series = %name, "creating series");
                    data.push(LabeledSeries {
                        name,
                        def,
                        labels: Vec::new(),
                        values: Vec::new(),
                    });
                    data.len() - 1
                });
                let ls = &mut data[idx];
                if let Some(label) = label {
                    ls.labels.push(label);
                }
                ls.values.push(value);
            }
        }
        check_iteration(&**ds).map_err(|e| e.with_context(format!("dataset {dsname:?}")))?;
        tracing::info!(dataset = dsname, rowcount, "finished reading dataset");

        all.extend(data.into_iter().filter(|ls| !skipped.contains(&ls.def.order)));
    }

    all.sort_by(|a, b| {
        a.def
            .order
            .cmp(&b.def.order)
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(all.into_iter().map(|ls| series_trace(ls, colors)).collect())
}

fn series_trace(ls: LabeledSeries<'_>, colors: &ColorTable) -> Trace {
    let def = ls.def;
    let color = colors
        .resolve(&def.color)
        .or_else(|| colors.default_color());
    match def.kind {
        SeriesKind::Bar => Trace::Bar(BarTrace {
            name: ls.name,
            orientation: Orientation::Vertical,
            x: ls.labels,
            y: ls.values,
            hovertemplate: (!def.hovertemplate.is_empty()).then(|| def.hovertemplate.clone()),
            marker: Marker::colored(color),
        }),
        SeriesKind::Hbar => Trace::Bar(BarTrace {
            name: ls.name,
            orientation: Orientation::Horizontal,
            x: ls.values,
            y: ls.labels,
            hovertemplate: (!def.hovertemplate.is_empty()).then(|| def.hovertemplate.clone()),
            marker: Marker::colored(color),
        }),
        SeriesKind::Line => {
            let with_markers = !def.marker.is_empty();
            Trace::Scatter(ScatterTrace {
                name: ls.name,
                x: ls.labels,
                y: ls.values,
                mode: if with_markers { "lines+markers" } else { "lines" }.to_owned(),
                fill: match def.fill {
                    FillKind::ToZero => Some("tozeroy".to_owned()),
                    FillKind::None => None,
                },
                marker: Marker {
                    color,
                    symbol: with_markers.then(|| def.marker.clone()),
                },
            })
        }
        SeriesKind::Box => Trace::Box(BoxTrace {
            name: ls.name,
            x: None,
            y: Some(ls.values),
            marker: Marker::colored(color),
        }),
        SeriesKind::Hbox => Trace::Box(BoxTrace {
            name: ls.name,
            x: Some(ls.values),
            y: None,
            marker: Marker::colored(color),
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/series.rs"]
mod tests;
