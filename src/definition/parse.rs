use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use crate::definition::model::PlotDef;
use crate::foundation::error::{PlotError, PlotResult};

impl PlotDef {
    /// Parse an already-templated definition.
    ///
    /// `fname` names the source file; its stem becomes the plot name when the document does not
    /// set one. Chart elements are annotated with their declaration order.
    pub fn parse(fname: impl AsRef<Path>, content: &str) -> PlotResult<Self> {
        let fname = fname.as_ref();
        tracing::info!(filename = %fname.display(), "parsing plot definition file");

        let mut pd: PlotDef = serde_yaml::from_str(content).map_err(|e| {
            PlotError::configuration(format!(
                "failed to unmarshal plot definition {}: {e}",
                fname.display()
            ))
        })?;

        if pd.name.is_empty() {
            pd.name = plot_name(fname);
        }
        if pd.layout.is_null() {
            pd.layout = serde_json::Value::Object(Default::default());
        }

        for (i, s) in pd.series.iter_mut().enumerate() {
            s.order = i;
        }
        for (i, s) in pd.scalars.iter_mut().enumerate() {
            s.order = i;
        }
        for (i, t) in pd.tables.iter_mut().enumerate() {
            t.order = i;
        }

        pd.validate()?;
        Ok(pd)
    }

    /// Structural checks that do not need any data.
    pub fn validate(&self) -> PlotResult<()> {
        if self.name.is_empty() {
            return Err(PlotError::configuration("plot name must be non-empty"));
        }
        if !self.layout.is_object() {
            return Err(PlotError::configuration(format!(
                "layout of plot {:?} must be a mapping",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for ds in &self.datasets {
            if ds.name.is_empty() {
                return Err(PlotError::configuration("dataset name must be non-empty"));
            }
            if !seen.insert(ds.name.as_str()) {
                return Err(PlotError::configuration(format!(
                    "duplicate dataset name: {:?}",
                    ds.name
                )));
            }
        }
        Ok(())
    }

    /// Human readable overview printed in validation mode.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Name: {}", self.name);
        let _ = writeln!(out, "Frequency: {}", self.frequency);
        out.push_str(&self.datasets_summary());
        out
    }

    /// The `Datasets:` block of [`PlotDef::summary`], queries indented below each entry.
    pub fn datasets_summary(&self) -> String {
        let mut out = String::from("Datasets:\n");
        for ds in &self.datasets {
            let _ = writeln!(out, "  Name: {}", ds.name);
            let _ = writeln!(out, "  Source: {}", ds.source);
            let _ = writeln!(out, "  Query:");
            let _ = writeln!(out, "{}", indent(&ds.query, "      "));
        }
        out
    }
}

/// Plot name derived from a definition file name: the file stem.
pub fn plot_name(fname: &Path) -> String {
    fname
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn indent(s: &str, prefix: &str) -> String {
    format!("{prefix}{}", s.trim_end().replace('\n', &format!("\n{prefix}")))
}

/// Queries are logged on one line.
pub(crate) fn strip_newlines(s: &str) -> String {
    s.replace('\n', " ")
}

#[cfg(test)]
#[path = "../../tests/unit/definition/parse.rs"]
mod tests;
