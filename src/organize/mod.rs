//! Versioned artifact layout.
//!
//! Artifacts live under a dated hierarchy, `base/YYYY/MM/DD/name.json` (hourly plots add an
//! `HH` level), and the newest version of each plot is copied to `base/latest/name.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::foundation::core::Frequency;
use crate::foundation::error::{PlotError, PlotResult};

pub const LATEST_DIR: &str = "latest";

/// Maps plot artifacts to paths below `base`.
#[derive(Clone, Debug)]
pub struct Organizer {
    base: PathBuf,
}

impl Organizer {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Dated path of `name` for the period containing `basis`.
    pub fn canonical_path(&self, name: &str, freq: Frequency, basis: DateTime<Utc>) -> PathBuf {
        let dated = freq.truncate_for_path(basis).format(freq.dated_format()).to_string();
        let mut path = self.base.clone();
        path.extend(dated.split('/'));
        path.push(format!("{name}.json"));
        path
    }

    pub fn latest_path(&self, name: &str) -> PathBuf {
        self.base.join(LATEST_DIR).join(format!("{name}.json"))
    }

    /// Existing dated artifacts of `name` whose directory levels match the frequency's layout
    /// (`20YY/MM/DD`, plus `HH` for hourly).
    pub fn dated_artifacts(&self, name: &str, freq: Frequency) -> PlotResult<Vec<PathBuf>> {
        let fname = format!("{name}.json");
        let mut dirs = vec![self.base.clone()];
        for level in 0..=freq.dated_depth() {
            let mut next = Vec::new();
            for dir in dirs {
                for sub in subdirs(&dir)? {
                    let Some(part) = sub.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if dated_component_matches(level, part) {
                        next.push(sub);
                    }
                }
            }
            dirs = next;
        }
        Ok(dirs
            .into_iter()
            .map(|d| d.join(&fname))
            .filter(|p| p.is_file())
            .collect())
    }

    /// Whether the dated artifact is missing or was last modified strictly before `expected`.
    pub fn is_stale_or_missing(
        &self,
        name: &str,
        freq: Frequency,
        basis: DateTime<Utc>,
        expected: SystemTime,
    ) -> PlotResult<bool> {
        let path = self.canonical_path(name, freq, basis);
        let meta = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => {
                return Err(PlotError::persistence(format!(
                    "stat file {}: {e}",
                    path.display()
                )));
            }
        };
        let mtime = meta.modified().map_err(|e| {
            PlotError::persistence(format!("modification time of {}: {e}", path.display()))
        })?;
        Ok(mtime < expected)
    }

    /// Whether the artifact for `basis` sorts last among all dated versions of `name`.
    pub fn is_latest(&self, name: &str, freq: Frequency, basis: DateTime<Utc>) -> PlotResult<bool> {
        let candidate = self.canonical_path(name, freq, basis);
        let mut existing = self.dated_artifacts(name, freq)?;
        existing.push(candidate.clone());
        existing.sort();
        Ok(existing.last() == Some(&candidate))
    }

    /// Write the dated artifact and refresh the latest copy when it is the newest version.
    ///
    /// Not atomic: a failure after the dated write leaves the latest copy stale.
    pub fn write_artifact(
        &self,
        data: &[u8],
        name: &str,
        freq: Frequency,
        basis: DateTime<Utc>,
    ) -> PlotResult<PathBuf> {
        let path = self.canonical_path(name, freq, basis);
        write_output(&path, data).map_err(|e| e.with_context("write plot"))?;

        if self.is_latest(name, freq, basis)? {
            let latest = self.latest_path(name);
            tracing::debug!(name, filename = %latest.display(), "updating latest");
            write_output(&latest, data).map_err(|e| e.with_context("write latest"))?;
        }
        Ok(path)
    }
}

fn subdirs(dir: &Path) -> PlotResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(PlotError::persistence(format!(
                "read directory {}: {e}",
                dir.display()
            )));
        }
    };
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            PlotError::persistence(format!("read directory {}: {e}", dir.display()))
        })?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            out.push(entry.path());
        }
    }
    Ok(out)
}

/// `20YY` for the year level, two digits below it.
fn dated_component_matches(level: usize, part: &str) -> bool {
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match level {
        0 => part.len() == 4 && part.starts_with("20") && digits(part),
        _ => part.len() == 2 && digits(part),
    }
}

/// Create parent directories and write `data` followed by a newline.
pub fn write_output(path: &Path, data: &[u8]) -> PlotResult<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            PlotError::persistence(format!("make directories {}: {e}", dir.display()))
        })?;
    }
    let mut buf = Vec::with_capacity(data.len() + 1);
    buf.extend_from_slice(data);
    buf.push(b'\n');
    std::fs::write(path, buf)
        .map_err(|e| PlotError::persistence(format!("write file {}: {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/organize/mod.rs"]
mod tests;
