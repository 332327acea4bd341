use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::data::dataset::{DataSet, StaticDataSet};
use crate::data::sqlite::SqliteDataSource;
use crate::data::value::FieldValue;
use crate::foundation::error::{PlotError, PlotResult};

/// Named provider of tabular datasets.
///
/// Implementations are shared between concurrent generations and must synchronize any internal
/// connection state themselves.
pub trait DataSource: Send + Sync {
    /// Run `query` with positional `params` and return the materialized result.
    fn get_dataset(&self, query: &str, params: &[FieldValue]) -> PlotResult<Box<dyn DataSet>>;
}

/// Lookup table from the source names used in plot definitions to providers.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn DataSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in `static` and `demo` sources.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.sources
            .insert("static".to_owned(), Arc::new(StaticDataSource));
        reg.sources.insert("demo".to_owned(), Arc::new(DemoDataSource));
        reg
    }

    pub fn register(&mut self, name: impl Into<String>, src: Arc<dyn DataSource>) -> PlotResult<()> {
        let name = name.into();
        if self.sources.contains_key(&name) {
            return Err(PlotError::configuration(format!(
                "duplicate source {name:?} specified"
            )));
        }
        self.sources.insert(name, src);
        Ok(())
    }

    /// Register a source from a `name=url` command line option.
    ///
    /// Only `sqlite:` urls are understood: `sqlite:path/to/db.sqlite` or `sqlite::memory:`.
    pub fn register_url_option(&mut self, opt: &str) -> PlotResult<()> {
        let Some((name, url)) = opt.split_once('=') else {
            return Err(PlotError::configuration(
                "source option not valid, use format 'name=url'",
            ));
        };
        let src: Arc<dyn DataSource> = match url.strip_prefix("sqlite:") {
            Some(path) => Arc::new(SqliteDataSource::new(path)),
            None => {
                return Err(PlotError::configuration(format!(
                    "unsupported source url: {url:?}"
                )));
            }
        };
        self.register(name, src)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DataSource>> {
        self.sources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.sources.keys()).finish()
    }
}

/// In-memory fixture source: the query is a YAML mapping of column name to values.
///
/// ```yaml
/// query: |
///   creature: [giraffes, orangutans]
///   count: [20, 14]
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticDataSource;

impl DataSource for StaticDataSource {
    fn get_dataset(&self, query: &str, _params: &[FieldValue]) -> PlotResult<Box<dyn DataSet>> {
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(query)
            .map_err(|e| PlotError::configuration(format!("parse static dataset: {e}")))?;

        let mut cols = Vec::with_capacity(parsed.len());
        for (k, v) in parsed {
            let name = k
                .as_str()
                .ok_or_else(|| PlotError::configuration("static column names must be strings"))?
                .to_owned();
            let values: Vec<JsonValue> = serde_yaml::from_value(v).map_err(|e| {
                PlotError::configuration(format!("static column {name:?} must be a list: {e}"))
            })?;
            cols.push((name, values.iter().map(FieldValue::from_json).collect()));
        }
        Ok(Box::new(StaticDataSet::from_columns(cols)?))
    }
}

/// Source with a few canned datasets for trying out definitions without a database.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemoDataSource;

impl DataSource for DemoDataSource {
    fn get_dataset(&self, query: &str, _params: &[FieldValue]) -> PlotResult<Box<dyn DataSet>> {
        match query.trim() {
            "populations" => {
                let ints = |v: [i64; 3]| -> Vec<FieldValue> {
                    v.into_iter().map(FieldValue::Int).collect()
                };
                let ds = StaticDataSet::from_columns(vec![
                    (
                        "creature".to_owned(),
                        vec!["giraffes".into(), "orangutans".into(), "monkeys".into()],
                    ),
                    ("month1".to_owned(), ints([20, 14, 23])),
                    ("month2".to_owned(), ints([2, 18, 29])),
                ])?;
                Ok(Box::new(ds))
            }
            other => Err(PlotError::configuration(format!(
                "unknown demo dataset: {other}"
            ))),
        }
    }
}
