//! Plotsmith turns declarative plot definitions into chart documents.
//!
//! A definition (YAML) names datasets to fetch from data sources, datasets to compute from
//! them, and chart elements (series, scalar indicators, heatmap tables) that read from those
//! datasets. Generation produces a JSON chart document that a charting library renders.
//!
//! # Pipeline overview
//!
//! 1. **Load**: placeholder template transform, then YAML parse into [`PlotDef`]
//! 2. **Fetch**: every declared dataset is resolved through the [`SourceRegistry`]
//! 3. **Compute**: derived datasets are built by joining two datasets with a named predicate
//! 4. **Generate**: series, scalar and table passes each scan a backing dataset once
//! 5. **Organize** (batch only): write into a dated output tree and refresh `latest/`
#![forbid(unsafe_code)]

pub mod batch;
pub mod compute;
pub mod config;
pub mod data;
pub mod definition;
pub mod foundation;
pub mod generate;
pub mod organize;

pub use batch::{BatchOptions, BatchReport, BatchRunner, JobOutcome};
pub use compute::join::{JoinInput, derive};
pub use compute::predicate::{BinaryPredicate, PredicateRegistry, diff};
pub use config::{PlotConfig, ProcessingProfile, Variant, load_colors, load_profiles};
pub use data::dataset::{DataSet, StaticDataSet};
pub use data::source::{DataSource, DemoDataSource, SourceRegistry, StaticDataSource};
pub use data::sqlite::SqliteDataSource;
pub use data::value::FieldValue;
pub use definition::color::ColorTable;
pub use definition::load_definition;
pub use definition::model::PlotDef;
pub use definition::template::TemplateVars;
pub use foundation::cancel::CancelToken;
pub use foundation::core::{Frequency, parse_basis};
pub use foundation::error::{PlotError, PlotResult};
pub use generate::trace::{Annotation, Trace};
pub use generate::{FigureDocument, generate_figure};
pub use organize::Organizer;
