//! Versioned generation of every definition in every configured profile.

pub mod heartbeat;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use regex::Regex;

use crate::batch::heartbeat::Heartbeat;
use crate::config::{PlotConfig, ProcessingProfile, Variant};
use crate::definition::load_definition;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{PlotError, PlotResult};
use crate::generate::generate_figure;
use crate::organize::Organizer;

pub const DEFAULT_CONCURRENCY: usize = 6;

#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Root of the versioned output tree.
    pub out_dir: PathBuf,
    /// Regenerate even when the dated artifact is up to date.
    pub force: bool,
    pub compact: bool,
    /// Report what would be generated without running queries.
    pub validate: bool,
    pub concurrency: usize,
    /// Replaces the default `*.yaml` selection of definition files.
    pub matcher: Option<Regex>,
    pub heartbeat: Duration,
}

impl BatchOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            force: false,
            compact: false,
            validate: false,
            concurrency: DEFAULT_CONCURRENCY,
            matcher: None,
            heartbeat: heartbeat::DEFAULT_INTERVAL,
        }
    }

    /// Worker count actually used: validation runs one job at a time so reports do not interleave.
    pub fn effective_concurrency(&self) -> usize {
        if self.validate {
            1
        } else {
            self.concurrency.max(1)
        }
    }
}

/// What happened to one (variant, definition file) job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Written { name: String, path: PathBuf },
    UpToDate { name: String },
    /// Validation report for the definition.
    Validated { name: String, report: String },
}

#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Written { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn up_to_date(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, JobOutcome::UpToDate { .. }))
            .count()
    }
}

struct Job<'a> {
    profile: &'a ProcessingProfile,
    variant: &'a Variant,
    file: PathBuf,
}

/// Runs every profile's definitions through generation and the organizer.
pub struct BatchRunner {
    cfg: PlotConfig,
    profiles: Vec<ProcessingProfile>,
    opts: BatchOptions,
}

impl BatchRunner {
    pub fn new(cfg: PlotConfig, profiles: Vec<ProcessingProfile>, opts: BatchOptions) -> Self {
        Self {
            cfg,
            profiles,
            opts,
        }
    }

    /// Process all jobs on a bounded pool.
    ///
    /// The first failing job cancels the rest; its error is returned in preference to the
    /// cancellations it caused.
    pub fn run(&self) -> PlotResult<BatchReport> {
        let mut jobs = Vec::new();
        for profile in &self.profiles {
            let files = profile.definition_files(self.opts.matcher.as_ref())?;
            tracing::info!(
                directory = %profile.directory.display(),
                files = files.len(),
                variants = profile.variants.len(),
                "using plot definitions"
            );
            for variant in &profile.variants {
                for file in &files {
                    jobs.push(Job {
                        profile,
                        variant,
                        file: file.clone(),
                    });
                }
            }
        }

        let threads = self.opts.effective_concurrency();
        tracing::info!(
            basis = %crate::foundation::core::format_rfc3339(self.cfg.basis_time),
            out = %self.opts.out_dir.display(),
            concurrency = threads,
            jobs = jobs.len(),
            "starting batch"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PlotError::configuration(format!("failed to build rayon thread pool: {e}")))?;

        let cancel = CancelToken::new();
        let results: Vec<PlotResult<JobOutcome>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    cancel.checkpoint()?;
                    let res = self.run_job(job, &cancel);
                    if let Err(e) = &res
                        && !e.is_cancelled()
                    {
                        tracing::error!(file = %job.file.display(), "plot failed: {e}");
                        cancel.cancel();
                    }
                    res
                })
                .collect()
        });

        let mut outcomes = Vec::with_capacity(results.len());
        let mut cancelled = None;
        for res in results {
            match res {
                Ok(o) => outcomes.push(o),
                Err(e) if e.is_cancelled() => {
                    cancelled.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(e) = cancelled {
            return Err(e);
        }
        Ok(BatchReport { outcomes })
    }

    fn run_job(&self, job: &Job<'_>, cancel: &CancelToken) -> PlotResult<JobOutcome> {
        let cfg = self.cfg.for_variant(job.variant);
        let sub = job.profile.output_dir(job.variant)?;
        let org = Organizer::new(if sub.is_empty() {
            self.opts.out_dir.clone()
        } else {
            self.opts.out_dir.join(sub)
        });

        let pd = load_definition(&job.file, &cfg.template_vars())
            .map_err(|e| e.with_context(format!("plot definition {}", job.file.display())))?;
        let name = pd.name.clone();

        let plot_path = org.canonical_path(&name, pd.frequency, cfg.basis_time);
        tracing::debug!(name = %name, filepath = %plot_path.display(), "plot filename");

        let def_mtime = std::fs::metadata(&job.file)
            .and_then(|m| m.modified())
            .map_err(|e| {
                PlotError::configuration(format!("stat {}: {e}", job.file.display()))
            })?;
        let stale = org
            .is_stale_or_missing(&name, pd.frequency, cfg.basis_time, def_mtime)
            .map_err(|e| e.with_context(format!("determine if plot {name:?} needs writing")))?;
        let should_write = self.opts.force || stale;

        if self.opts.validate {
            let latest = org
                .is_latest(&name, pd.frequency, cfg.basis_time)
                .map_err(|e| e.with_context(format!("determine if plot {name:?} is latest")))?;
            let mut report = String::new();
            let _ = writeln!(report, "Name: {}", pd.name);
            let _ = writeln!(report, "Frequency: {}", pd.frequency);
            let _ = writeln!(report, "Output: {}", plot_path.display());
            let _ = writeln!(report, "Is missing or stale: {stale}");
            let _ = writeln!(report, "Is latest version: {latest}");
            report.push_str(&pd.datasets_summary());
            return Ok(JobOutcome::Validated { name, report });
        }

        if !should_write {
            tracing::info!(name = %name, "skipping plot, output already exists");
            return Ok(JobOutcome::UpToDate { name });
        }

        tracing::info!(name = %name, "generating plot");
        let doc = {
            let _hb = Heartbeat::start(&name, self.opts.heartbeat);
            generate_figure(&pd, &cfg, cancel)
                .map_err(|e| e.with_context(format!("failed to generate plot {name:?}")))?
        };
        let data = doc.to_json_bytes(self.opts.compact)?;

        tracing::info!(name = %name, filename = %plot_path.display(), "writing plot output");
        let path = org
            .write_artifact(&data, &name, pd.frequency, cfg.basis_time)
            .map_err(|e| e.with_context(format!("failed to write plot {name:?}")))?;
        Ok(JobOutcome::Written { name, path })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/mod.rs"]
mod tests;
