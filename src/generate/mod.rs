//! Plot definition to chart document.
//!
//! Declared datasets are fetched from their sources, computed datasets are derived from them, and
//! the series, scalar and table passes then each scan every backing dataset once.

pub mod scalar;
pub mod series;
pub mod table;
pub mod trace;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::compute::join::{self, JoinInput, KEY_FIELD, VALUE_FIELD};
use crate::compute::predicate::{BinaryPredicate, PredicateRegistry};
use crate::config::PlotConfig;
use crate::data::dataset::{DataSet, StaticDataSet};
use crate::definition::model::{ComputeInputDef, ComputedDef, PlotDef};
use crate::definition::parse::strip_newlines;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{PlotError, PlotResult};
use crate::generate::trace::{Annotation, Trace};

/// Datasets of one generation run, by name.
pub type DataSets = HashMap<String, Box<dyn DataSet>>;

/// The generated artifact: traces, layout and config for the renderer plus the definition's
/// parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FigureDocument {
    pub data: Vec<Trace>,
    pub layout: JsonValue,
    pub config: JsonValue,
    pub params: BTreeMap<String, JsonValue>,
}

impl FigureDocument {
    /// Serialize as pretty-printed (two-space indent) or compact JSON.
    pub fn to_json_bytes(&self, compact: bool) -> PlotResult<Vec<u8>> {
        let res = if compact {
            serde_json::to_vec(self)
        } else {
            serde_json::to_vec_pretty(self)
        };
        res.map_err(|e| PlotError::serde(format!("failed to marshal to json: {e}")))
    }

    pub fn annotations(&self) -> &[JsonValue] {
        self.layout
            .get("annotations")
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Generate the chart document for `pd`.
///
/// `cancel` is consulted before each dataset fetch and each computed derivation.
#[tracing::instrument(skip_all, fields(name = %pd.name))]
pub fn generate_figure(
    pd: &PlotDef,
    cfg: &PlotConfig,
    cancel: &CancelToken,
) -> PlotResult<FigureDocument> {
    let mut datasets = DataSets::new();

    for ds in &pd.datasets {
        cancel.checkpoint()?;
        let src = cfg.sources.get(&ds.source).ok_or_else(|| {
            let known = cfg.sources.names().collect::<Vec<_>>().join(", ");
            PlotError::configuration(format!(
                "unknown source {:?} for dataset {:?}, known sources: {known}",
                ds.source, ds.name
            ))
        })?;
        tracing::debug!(
            dataset = %ds.name,
            source = %ds.source,
            query = %strip_newlines(&ds.query),
            "getting dataset"
        );
        let set = src.get_dataset(&ds.query, &[]).map_err(|e| {
            e.with_context(format!(
                "failed to get dataset {:?} from source {:?}",
                ds.name, ds.source
            ))
        })?;
        datasets.insert(ds.name.clone(), set);
    }

    for cds in &pd.computed {
        cancel.checkpoint()?;
        let set = compute_dataset(cds, &mut datasets, &cfg.predicates)
            .map_err(|e| e.with_context(format!("computed dataset {:?}", cds.name)))?;
        tracing::debug!(computed = %cds.name, rowcount = set.len(), "computed dataset");
        datasets.insert(cds.name.clone(), Box::new(set));
    }

    let mut data = series::series_traces(&mut datasets, &pd.series, &cfg.colors)
        .map_err(|e| e.with_context("series traces"))?;
    data.extend(
        scalar::scalar_traces(&mut datasets, &pd.scalars, &cfg.colors)
            .map_err(|e| e.with_context("scalar traces"))?,
    );
    let (tables, annotations) =
        table::table_traces(&mut datasets, &pd.tables).map_err(|e| e.with_context("table traces"))?;
    data.extend(tables);

    Ok(FigureDocument {
        data,
        layout: layout_with_annotations(&pd.layout, annotations)?,
        config: if pd.config.is_null() {
            JsonValue::Object(Default::default())
        } else {
            pd.config.clone()
        },
        params: pd.parameters.clone(),
    })
}

fn layout_with_annotations(layout: &JsonValue, annotations: Vec<Annotation>) -> PlotResult<JsonValue> {
    let mut layout = match layout {
        JsonValue::Null => serde_json::Map::new(),
        JsonValue::Object(m) => m.clone(),
        _ => return Err(PlotError::configuration("layout must be a mapping")),
    };
    if !annotations.is_empty() {
        let annotations = serde_json::to_value(annotations)
            .map_err(|e| PlotError::serde(format!("failed to encode annotations: {e}")))?;
        layout.insert("annotations".to_owned(), annotations);
    }
    Ok(JsonValue::Object(layout))
}

fn compute_dataset(
    cds: &ComputedDef,
    datasets: &mut DataSets,
    predicates: &PredicateRegistry,
) -> PlotResult<StaticDataSet> {
    if datasets.contains_key(&cds.name) {
        return Err(PlotError::configuration(
            "computed dataset name conflicts with existing dataset",
        ));
    }
    let [left, right] = cds.datasets.as_slice() else {
        return Err(PlotError::configuration(format!(
            "unexpected number of datasets: {}",
            cds.datasets.len()
        )));
    };
    for input in [left, right] {
        if !datasets.contains_key(&input.dataset) {
            return Err(PlotError::configuration(format!(
                "unknown dataset {:?}",
                input.dataset
            )));
        }
    }
    let pred = predicates.get(&cds.function).ok_or_else(|| {
        PlotError::configuration(format!("unknown function {:?}", cds.function))
    })?;

    tracing::debug!(
        computed = %cds.name,
        function = %cds.function,
        dataset1 = %left.dataset,
        dataset2 = %right.dataset,
        "computing dataset"
    );

    let Some(mut left_set) = datasets.remove(&left.dataset) else {
        return Err(PlotError::configuration(format!(
            "unknown dataset {:?}",
            left.dataset
        )));
    };
    let left_input = JoinInput {
        name: &left.dataset,
        dataset: &mut *left_set,
        join_field: &left.join_field,
        value_field: &left.value_field,
    };

    let res = if left.dataset == right.dataset {
        project_and_derive(pred, left_input, right)
    } else {
        match datasets.get_mut(&right.dataset) {
            Some(right_set) => join::derive(
                pred,
                left_input,
                JoinInput {
                    name: &right.dataset,
                    dataset: &mut **right_set,
                    join_field: &right.join_field,
                    value_field: &right.value_field,
                },
            ),
            None => Err(PlotError::configuration(format!(
                "unknown dataset {:?}",
                right.dataset
            ))),
        }
    };
    datasets.insert(left.dataset.clone(), left_set);
    res
}

/// Self join: the right side reads from a projected copy of the shared dataset.
fn project_and_derive(
    pred: BinaryPredicate,
    left: JoinInput<'_>,
    right: &ComputeInputDef,
) -> PlotResult<StaticDataSet> {
    let mut copy = join::project(JoinInput {
        name: left.name,
        dataset: &mut *left.dataset,
        join_field: &right.join_field,
        value_field: &right.value_field,
    })?;
    join::derive(
        pred,
        left,
        JoinInput {
            name: &right.dataset,
            dataset: &mut copy,
            join_field: KEY_FIELD,
            value_field: VALUE_FIELD,
        },
    )
}

/// Group chart element definitions by backing dataset, in first-appearance order.
///
/// Definitions naming a dataset that does not exist are logged and left out.
pub(crate) fn partition_by_dataset<'a, T>(
    defs: &'a [T],
    datasets: &DataSets,
    what: &str,
    dataset_of: impl Fn(&T) -> &str,
) -> Vec<(&'a str, Vec<&'a T>)> {
    let mut groups: Vec<(&'a str, Vec<&'a T>)> = Vec::new();
    for (i, def) in defs.iter().enumerate() {
        let ds = dataset_of(def);
        if !datasets.contains_key(ds) {
            tracing::warn!(dataset = ds, index = i, "unknown dataset name in {what}, skipping");
            continue;
        }
        match groups.iter_mut().find(|(name, _)| *name == ds) {
            Some((_, members)) => members.push(def),
            None => groups.push((ds, vec![def])),
        }
    }
    groups
}

#[cfg(test)]
#[path = "../../tests/unit/generate/mod.rs"]
mod tests;
