use std::collections::{HashMap, HashSet};

use serde_json::Value as JsonValue;

use crate::data::dataset::check_iteration;
use crate::data::value::FieldValue;
use crate::definition::model::{TableDef, TableKind};
use crate::foundation::error::{PlotError, PlotResult};
use crate::generate::DataSets;
use crate::generate::trace::{Annotation, HeatmapTrace, Trace};

/// Cells accumulated for one table while scanning its dataset.
struct LabeledTable<'a> {
    name: String,
    def: &'a TableDef,
    labels_x: Vec<FieldValue>,
    labels_y: Vec<FieldValue>,
    x_index: HashMap<String, usize>,
    y_index: HashMap<String, usize>,
    cells: HashMap<(usize, usize), FieldValue>,
}

impl<'a> LabeledTable<'a> {
    fn new(def: &'a TableDef) -> Self {
        Self {
            name: def.name.clone(),
            def,
            labels_x: Vec::new(),
            labels_y: Vec::new(),
            x_index: HashMap::new(),
            y_index: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    fn insert(&mut self, x: FieldValue, y: FieldValue, value: FieldValue) -> PlotResult<()> {
        let xi = label_index(&mut self.labels_x, &mut self.x_index, x);
        let yi = label_index(&mut self.labels_y, &mut self.y_index, y);
        if self.cells.contains_key(&(xi, yi)) {
            return Err(PlotError::configuration(format!(
                "found two values for {}/{}",
                self.labels_x[xi].key_text(),
                self.labels_y[yi].key_text()
            )));
        }
        self.cells.insert((xi, yi), value);
        Ok(())
    }

    /// Dense `z[y][x]`.
    fn value_z(&self) -> Vec<Vec<JsonValue>> {
        (0..self.labels_y.len())
            .map(|y| {
                (0..self.labels_x.len())
                    .map(|x| {
                        self.cells
                            .get(&(x, y))
                            .map_or(JsonValue::Null, FieldValue::to_json)
                    })
                    .collect()
            })
            .collect()
    }

    /// One annotation per cell, row by row.
    fn annotations(&self) -> Vec<Annotation> {
        let mut out = Vec::with_capacity(self.labels_x.len() * self.labels_y.len());
        for (y, ly) in self.labels_y.iter().enumerate() {
            for (x, lx) in self.labels_x.iter().enumerate() {
                let text = match self.cells.get(&(x, y)) {
                    Some(v) => match v.as_f64() {
                        Some(f) => format!("{f:.3}"),
                        None => v.key_text(),
                    },
                    None => String::new(),
                };
                out.push(Annotation {
                    xref: "x1".to_owned(),
                    yref: "y1".to_owned(),
                    x: lx.to_json(),
                    y: ly.to_json(),
                    text,
                    showarrow: false,
                });
            }
        }
        out
    }

    fn into_trace(self) -> (Trace, Vec<Annotation>) {
        let z = self.value_z();
        let annotations = self.annotations();
        let trace = match self.def.kind {
            TableKind::Heatmap => Trace::Heatmap(HeatmapTrace {
                name: self.name,
                x: self.labels_x.iter().map(FieldValue::to_json).collect(),
                y: self.labels_y.iter().map(FieldValue::to_json).collect(),
                z,
                colorscale: "Viridis".to_owned(),
                reversescale: true,
                colorbar: self.def.colorbar.clone(),
            }),
        };
        (trace, annotations)
    }
}

fn label_index(labels: &mut Vec<FieldValue>, index: &mut HashMap<String, usize>, v: FieldValue) -> usize {
    *index.entry(v.key_text()).or_insert_with(|| {
        labels.push(v);
        labels.len() - 1
    })
}

/// Build heatmap traces and their cell annotations.
///
/// Axis labels keep first-seen order. Two rows for the same `(x, y)` cell are a configuration
/// error.
pub fn table_traces(
    datasets: &mut DataSets,
    defs: &[TableDef],
) -> PlotResult<(Vec<Trace>, Vec<Annotation>)> {
    let mut all: Vec<LabeledTable<'_>> = Vec::new();

    for (dsname, tables) in super::partition_by_dataset(defs, datasets, "table", |t| &t.dataset) {
        let Some(ds) = datasets.get_mut(dsname) else {
            continue;
        };

        let mut data: Vec<LabeledTable<'_>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut skipped: HashSet<usize> = HashSet::new();

        tracing::info!(dataset = dsname, "reading dataset");
        ds.reset();
        while ds.next() {
            for &def in &tables {
                if skipped.contains(&def.order) {
                    continue;
                }
                let cell = [&def.labels_x, &def.labels_y, &def.values].map(|f| (f, ds.field(f)));
                if let Some((f, FieldValue::Error(e))) = cell.iter().find(|(_, v)| v.is_error()) {
                    tracing::warn!(dataset = dsname, table = %def.name, field = %f, "skipping table: {e}");
                    skipped.insert(def.order);
                    continue;
                }
                let [(_, x), (_, y), (_, value)] = cell;

                let idx = *index.entry(def.name.clone()).or_insert_with(|| {
                    tracing::debug!(dataset = dsname, table = %def.name, "creating table");
                    data.push(LabeledTable::new(def));
                    data.len() - 1
                });
                data[idx]
                    .insert(x, y, value)
                    .map_err(|e| e.with_context(format!("table {:?}", def.name)))?;
            }
        }
        check_iteration(&**ds).map_err(|e| e.with_context(format!("dataset {dsname:?}")))?;

        all.extend(data.into_iter().filter(|lt| !skipped.contains(&lt.def.order)));
    }

    all.sort_by(|a, b| {
        a.def
            .order
            .cmp(&b.def.order)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut traces = Vec::with_capacity(all.len());
    let mut annotations = Vec::new();
    for lt in all {
        let (trace, notes) = lt.into_trace();
        traces.push(trace);
        annotations.extend(notes);
    }
    Ok((traces, annotations))
}

#[cfg(test)]
#[path = "../../tests/unit/generate/table.rs"]
mod tests;
