use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::compute::predicate::PredicateRegistry;
use crate::data::source::SourceRegistry;
use crate::definition::color::ColorTable;
use crate::definition::template::TemplateVars;
use crate::foundation::error::{PlotError, PlotResult};

/// Template parameters of one profile variant.
pub type Variant = BTreeMap<String, String>;

/// Everything a generation needs besides the definition itself.
#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub basis_time: DateTime<Utc>,
    pub sources: SourceRegistry,
    pub predicates: PredicateRegistry,
    pub template_params: Variant,
    pub colors: ColorTable,
}

impl PlotConfig {
    /// Config with the built-in sources and predicates and an empty color table.
    pub fn new(basis_time: DateTime<Utc>) -> Self {
        Self {
            basis_time,
            sources: SourceRegistry::with_builtins(),
            predicates: PredicateRegistry::new(),
            template_params: Variant::new(),
            colors: ColorTable::default(),
        }
    }

    pub fn template_vars(&self) -> TemplateVars {
        TemplateVars::new(self.basis_time).with_params(self.template_params.clone())
    }

    /// Copy of this config whose template parameters are `variant` layered over the current ones.
    pub fn for_variant(&self, variant: &Variant) -> Self {
        let mut cfg = self.clone();
        cfg.template_params
            .extend(variant.iter().map(|(k, v)| (k.clone(), v.clone())));
        cfg
    }
}

/// A set of definitions generated together, once per variant.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingProfile {
    /// Definitions directory (every `*.yaml` in it) or a single definition file.
    pub directory: PathBuf,
    /// Output sub-directory template; `{key}` is replaced from the variant.
    #[serde(default)]
    pub output: String,
    #[serde(default, deserialize_with = "de_variants")]
    pub variants: Vec<Variant>,
}

static OUTPUT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_-]+)\}").unwrap_or_else(|e| panic!("output key regex: {e}"))
});

impl ProcessingProfile {
    /// Render the output sub-directory for `variant`.
    pub fn output_dir(&self, variant: &Variant) -> PlotResult<String> {
        let mut missing = None;
        let out = OUTPUT_KEY.replace_all(&self.output, |caps: &regex::Captures<'_>| {
            match variant.get(&caps[1]) {
                Some(v) => v.clone(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_owned());
                    String::new()
                }
            }
        });
        if let Some(key) = missing {
            return Err(PlotError::configuration(format!(
                "output template {:?} references unknown variant key {key:?}",
                self.output
            )));
        }
        Ok(out.into_owned())
    }

    /// Definition files of this profile, sorted by path.
    ///
    /// `matcher` replaces the default `*.yaml` file-name filter when given.
    pub fn definition_files(&self, matcher: Option<&Regex>) -> PlotResult<Vec<PathBuf>> {
        if self.directory.is_file() {
            let keep = match matcher {
                Some(re) => self
                    .directory
                    .file_name()
                    .is_some_and(|n| re.is_match(&n.to_string_lossy())),
                None => true,
            };
            return Ok(if keep {
                vec![self.directory.clone()]
            } else {
                Vec::new()
            });
        }

        let entries = std::fs::read_dir(&self.directory).map_err(|e| {
            PlotError::configuration(format!(
                "failed to read input directory {}: {e}",
                self.directory.display()
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                PlotError::configuration(format!(
                    "failed to read input directory {}: {e}",
                    self.directory.display()
                ))
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let fname = entry.file_name().to_string_lossy().into_owned();
            let keep = match matcher {
                Some(re) => re.is_match(&fname),
                None => fname.ends_with(".yaml"),
            };
            if keep {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn de_variants<'de, D>(d: D) -> Result<Vec<Variant>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<BTreeMap<String, serde_yaml::Value>>> = Option::deserialize(d)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|m| {
            m.into_iter()
                .map(|(k, v)| match scalar_text(&v) {
                    Some(s) => Ok((k, s)),
                    None => Err(serde::de::Error::custom(format!(
                        "variant value for {k:?} must be a scalar"
                    ))),
                })
                .collect()
        })
        .collect()
}

fn scalar_text(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Read `profiles.yaml` from `conf_dir`.
///
/// Profile directories are resolved against `conf_dir`, and a profile without variants gets a
/// single empty one.
pub fn load_profiles(conf_dir: &Path) -> PlotResult<Vec<ProcessingProfile>> {
    let path = conf_dir.join("profiles.yaml");
    let content = std::fs::read_to_string(&path).map_err(|e| {
        PlotError::configuration(format!("failed to read profiles {}: {e}", path.display()))
    })?;
    let mut profiles: Vec<ProcessingProfile> = serde_yaml::from_str(&content).map_err(|e| {
        PlotError::configuration(format!("failed to unmarshal processing profiles: {e}"))
    })?;

    for p in &mut profiles {
        p.directory = conf_dir.join(&p.directory);
        if p.variants.is_empty() {
            p.variants.push(Variant::new());
        }
    }
    Ok(profiles)
}

/// Read `colors.yaml` from `conf_dir`.
pub fn load_colors(conf_dir: &Path) -> PlotResult<ColorTable> {
    ColorTable::load(&conf_dir.join("colors.yaml"))
}

/// Translate a shell-style glob (`*`, `?`, `[...]`) into an anchored regex.
pub fn glob_to_regex(glob: &str) -> PlotResult<Regex> {
    let mut re = String::with_capacity(glob.len() + 8);
    re.push('^');
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '[' => {
                re.push('[');
                let mut first = true;
                loop {
                    let Some(c) = chars.next() else {
                        return Err(PlotError::configuration(format!(
                            "unterminated character class in glob {glob:?}"
                        )));
                    };
                    match c {
                        ']' if !first => break,
                        '^' | '!' if first => re.push('^'),
                        '\\' | '[' | '&' | '~' => {
                            re.push('\\');
                            re.push(c);
                        }
                        c => re.push(c),
                    }
                    first = false;
                }
                re.push(']');
            }
            '\\' => match chars.next() {
                Some(c) => re.push_str(&regex::escape(&c.to_string())),
                None => {
                    return Err(PlotError::configuration(format!(
                        "trailing escape in glob {glob:?}"
                    )));
                }
            },
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| PlotError::configuration(format!("invalid glob {glob:?}: {e}")))
}
