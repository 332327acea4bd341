use super::*;
use crate::config::load_profiles;
use chrono::{TimeZone, Utc};

const POPS: &str = r#"
frequency: daily
datasets:
  - name: pops
    source: demo
    query: populations
series:
  - {type: bar, name: "{{ .Params.label }}", dataset: pops, labels: creature, values: month1}
"#;

struct Fixture {
    conf: tempfile::TempDir,
    out: tempfile::TempDir,
}

fn fixture(profiles: &str, defs: &[(&str, &str)]) -> Fixture {
    let conf = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::create_dir(conf.path().join("plots")).unwrap();
    for (name, body) in defs {
        std::fs::write(conf.path().join("plots").join(name), body).unwrap();
    }
    std::fs::write(conf.path().join("profiles.yaml"), profiles).unwrap();
    Fixture { conf, out }
}

fn runner(fx: &Fixture, tweak: impl FnOnce(&mut BatchOptions)) -> BatchRunner {
    let cfg = PlotConfig::new(Utc.with_ymd_and_hms(2023, 5, 8, 10, 0, 0).unwrap());
    let mut opts = BatchOptions::new(fx.out.path());
    opts.heartbeat = Duration::from_millis(10);
    tweak(&mut opts);
    BatchRunner::new(cfg, load_profiles(fx.conf.path()).unwrap(), opts)
}

const DEFAULT_PROFILE: &str = "- directory: plots\n  variants:\n    - {label: counts}\n";

#[test]
fn writes_dated_and_latest_then_skips_up_to_date() {
    let fx = fixture(DEFAULT_PROFILE, &[("zoo.yaml", POPS), ("notes.txt", "ignored")]);

    let report = runner(&fx, |_| {}).run().unwrap();
    let written: Vec<&Path> = report.written().collect();
    assert_eq!(written, [fx.out.path().join("2023/05/08/zoo.json").as_path()]);

    let latest = std::fs::read_to_string(fx.out.path().join("latest/zoo.json")).unwrap();
    assert!(latest.ends_with("}\n"));
    let doc: serde_json::Value = serde_json::from_str(&latest).unwrap();
    assert_eq!(doc["data"][0]["name"], "counts");

    let again = runner(&fx, |_| {}).run().unwrap();
    assert_eq!(again.up_to_date(), 1);
    assert_eq!(again.written().count(), 0);

    let forced = runner(&fx, |o| o.force = true).run().unwrap();
    assert_eq!(forced.written().count(), 1);
}

#[test]
fn compact_output_is_single_line() {
    let fx = fixture(DEFAULT_PROFILE, &[("zoo.yaml", POPS)]);
    runner(&fx, |o| o.compact = true).run().unwrap();
    let body = std::fs::read_to_string(fx.out.path().join("2023/05/08/zoo.json")).unwrap();
    assert_eq!(body.lines().count(), 1);
}

#[test]
fn variants_render_into_their_output_directories() {
    let fx = fixture(
        "- directory: plots\n  output: '{label}'\n  variants:\n    - {label: north}\n    - {label: south}\n",
        &[("zoo.yaml", POPS)],
    );
    let report = runner(&fx, |_| {}).run().unwrap();
    assert_eq!(report.written().count(), 2);
    for label in ["north", "south"] {
        let body =
            std::fs::read_to_string(fx.out.path().join(label).join("latest/zoo.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["data"][0]["name"], label);
    }
}

#[test]
fn validate_reports_without_writing() {
    let fx = fixture(DEFAULT_PROFILE, &[("zoo.yaml", POPS)]);
    let report = runner(&fx, |o| {
        o.validate = true;
        o.concurrency = 8;
    })
    .run()
    .unwrap();

    let JobOutcome::Validated { name, report } = &report.outcomes[0] else {
        panic!("expected a validation report, got {:?}", report.outcomes);
    };
    assert_eq!(name, "zoo");
    assert!(report.starts_with("Name: zoo\nFrequency: daily\nOutput: "));
    assert!(report.contains("Is missing or stale: true\nIs latest version: true\nDatasets:\n  Name: pops\n"));
    assert!(!fx.out.path().join("latest").exists());
}

#[test]
fn match_glob_selects_files() {
    let other = POPS.replace("month1", "month2");
    let fx = fixture(DEFAULT_PROFILE, &[("zoo.yaml", POPS), ("farm.yaml", &other)]);
    let matcher = crate::config::glob_to_regex("f*").unwrap();
    let report = runner(&fx, |o| o.matcher = Some(matcher)).run().unwrap();
    let written: Vec<&Path> = report.written().collect();
    assert_eq!(written, [fx.out.path().join("2023/05/08/farm.json").as_path()]);
}

#[test]
fn first_failure_is_reported() {
    let broken = "datasets:\n  - {name: a, source: nowhere, query: x}\n";
    let fx = fixture(DEFAULT_PROFILE, &[("a_broken.yaml", broken), ("zoo.yaml", POPS)]);
    let err = runner(&fx, |o| o.concurrency = 1).run().unwrap_err();
    assert!(matches!(err, PlotError::Configuration(_)), "{err}");
    assert!(err.to_string().contains("nowhere"));
}

#[test]
fn template_errors_name_the_file() {
    let fx = fixture(DEFAULT_PROFILE, &[("bad.yaml", "name: {{ .Params.nope }}\n")]);
    let err = runner(&fx, |_| {}).run().unwrap_err();
    assert!(err.to_string().contains("bad.yaml"));
}
