pub mod color;
pub mod model;
pub mod parse;
pub mod template;

use std::path::Path;

use crate::definition::model::PlotDef;
use crate::definition::template::TemplateVars;
use crate::foundation::error::{PlotError, PlotResult};

/// Read, template and parse a definition file.
pub fn load_definition(path: &Path, vars: &TemplateVars) -> PlotResult<PlotDef> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PlotError::configuration(format!("failed to read plot definition {}: {e}", path.display()))
    })?;
    let content = template::render(&raw, vars)
        .map_err(|e| e.with_context(format!("template {}", path.display())))?;
    PlotDef::parse(path, &content)
}
