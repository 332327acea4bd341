use std::collections::HashMap;

use crate::data::value::FieldValue;
use crate::definition::color::ColorTable;
use crate::definition::model::{DeltaKind, ScalarDef};
use crate::foundation::error::{PlotError, PlotResult};
use crate::generate::DataSets;
use crate::generate::trace::{
    FontColor, IndicatorDelta, IndicatorDomain, IndicatorNumber, IndicatorTitle, IndicatorTrace,
    Trace,
};

/// Build indicator traces from the first row of each referenced dataset.
///
/// Scalar `i` of `n` declared scalars occupies column `i` and the horizontal domain
/// `[i/n, (i+1)/n]`. Unknown datasets, empty datasets and missing or non-numeric fields skip
/// only the affected scalar.
pub fn scalar_traces(
    datasets: &mut DataSets,
    defs: &[ScalarDef],
    colors: &ColorTable,
) -> PlotResult<Vec<Trace>> {
    // dataset -> fields to read from its first row, in first-use order
    let mut wanted: Vec<(&str, Vec<&str>)> = Vec::new();
    for s in defs {
        if !datasets.contains_key(&s.dataset) {
            tracing::warn!(dataset = %s.dataset, scalar = %s.name, "unknown dataset name for scalar");
            continue;
        }
        want(&mut wanted, &s.dataset, &s.value);
        if !s.delta_dataset.is_empty() {
            if !datasets.contains_key(&s.delta_dataset) {
                tracing::warn!(dataset = %s.delta_dataset, scalar = %s.name, "unknown delta dataset name for scalar");
                continue;
            }
            want(&mut wanted, &s.delta_dataset, &s.delta_value);
        }
    }

    let mut values: HashMap<(&str, &str), f64> = HashMap::new();
    for (dsname, fields) in wanted {
        let Some(ds) = datasets.get_mut(dsname) else {
            continue;
        };
        tracing::info!(dataset = dsname, "reading first row of dataset");
        ds.reset();
        if !ds.next() {
            match ds.err() {
                Some(e) => tracing::warn!(dataset = dsname, "error reading dataset: {e}"),
                None => tracing::warn!(dataset = dsname, "no rows found for dataset"),
            }
            continue;
        }
        for field in fields {
            match ds.field(field) {
                FieldValue::Int(v) => {
                    values.insert((dsname, field), v as f64);
                }
                FieldValue::Float(v) => {
                    values.insert((dsname, field), v);
                }
                other => tracing::warn!(
                    dataset = dsname,
                    field,
                    kind = other.kind(),
                    "field not read from dataset"
                ),
            }
        }
    }

    let n = defs.len() as f64;
    let mut traces = Vec::new();
    for (idx, s) in defs.iter().enumerate() {
        let Some(&value) = values.get(&(s.dataset.as_str(), s.value.as_str())) else {
            tracing::warn!(scalar = %s.name, "missing value field for scalar");
            continue;
        };

        let mut trace = IndicatorTrace {
            name: s.name.clone(),
            mode: "number".to_owned(),
            value,
            number: IndicatorNumber {
                prefix: s.value_prefix.clone(),
                suffix: s.value_suffix.clone(),
                font: None,
            },
            delta: None,
            domain: IndicatorDomain {
                column: idx,
                x: [idx as f64 / n, (idx + 1) as f64 / n],
            },
            title: IndicatorTitle {
                text: s.name.clone(),
            },
        };

        let mut number_color = colors.resolve(&s.color);
        if !s.delta_dataset.is_empty() {
            let Some(&reference) =
                values.get(&(s.delta_dataset.as_str(), s.delta_value.as_str()))
            else {
                tracing::warn!(scalar = %s.name, "missing delta value field for scalar");
                continue;
            };
            match s.delta_type {
                DeltaKind::Relative => {
                    let increasing = colors.resolve(&s.increase_color);
                    let decreasing = colors.resolve(&s.decrease_color);
                    if value > reference && increasing.is_some() {
                        number_color = increasing.clone();
                    } else if value < reference && decreasing.is_some() {
                        number_color = decreasing.clone();
                    }
                    trace.mode = "number+delta".to_owned();
                    trace.delta = Some(IndicatorDelta {
                        reference,
                        relative: true,
                        valueformat: ".2%".to_owned(),
                        increasing: increasing.map(|color| FontColor { color }),
                        decreasing: decreasing.map(|color| FontColor { color }),
                    });
                }
                DeltaKind::None => {
                    return Err(PlotError::configuration(format!(
                        "scalar {:?} has a delta dataset but no delta type",
                        s.name
                    )));
                }
            }
        }
        trace.number.font = number_color.map(|color| FontColor { color });

        traces.push(Trace::Indicator(trace));
    }
    Ok(traces)
}

fn want<'a>(wanted: &mut Vec<(&'a str, Vec<&'a str>)>, ds: &'a str, field: &'a str) {
    match wanted.iter_mut().find(|(name, _)| *name == ds) {
        Some((_, fields)) => fields.push(field),
        None => wanted.push((ds, vec![field])),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/scalar.rs"]
mod tests;
