use super::*;
use chrono::{TimeZone, Utc};
use serde_json::json;

fn cfg() -> PlotConfig {
    PlotConfig::new(Utc.with_ymd_and_hms(2023, 5, 8, 10, 0, 0).unwrap())
}

fn def(doc: &str) -> PlotDef {
    PlotDef::parse("test.yaml", doc).unwrap()
}

const ZOO: &str = r#"
datasets:
  - name: pops
    source: demo
    query: populations
computed:
  - name: growth
    function: diff
    datasets:
      - { dataset: pops, joinField: creature, valueField: month2 }
      - { dataset: pops, joinField: creature, valueField: month1 }
series:
  - type: bar
    name: month1
    dataset: pops
    labels: creature
    values: month1
  - type: line
    name: growth
    dataset: growth
    labels: key
    values: value
layout:
  title: {text: Zoo}
config:
  displayModeBar: false
parameters:
  region: north
"#;

#[test]
fn generates_series_from_declared_and_computed_datasets() {
    let doc = generate_figure(&def(ZOO), &cfg(), &CancelToken::new()).unwrap();
    let v = serde_json::to_value(&doc).unwrap();

    assert_eq!(v["data"][0]["type"], "bar");
    assert_eq!(v["data"][0]["x"], json!(["giraffes", "orangutans", "monkeys"]));
    assert_eq!(v["data"][0]["y"], json!([20, 14, 23]));
    assert_eq!(v["data"][1]["type"], "scatter");
    assert_eq!(v["data"][1]["y"], json!([-18, 4, 6]));
    assert_eq!(v["layout"], json!({"title": {"text": "Zoo"}}));
    assert_eq!(v["config"], json!({"displayModeBar": false}));
    assert_eq!(v["params"], json!({"region": "north"}));
    assert!(doc.annotations().is_empty());
}

#[test]
fn unknown_source_is_a_configuration_error() {
    let pd = def("datasets:\n  - {name: a, source: warehouse, query: x}\n");
    let err = generate_figure(&pd, &cfg(), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, PlotError::Configuration(_)));
    assert!(err.to_string().contains("warehouse"));
    assert!(err.to_string().contains("known sources: demo, static"), "{err}");
}

#[test]
fn source_failures_name_the_dataset() {
    let pd = def("datasets:\n  - {name: weather, source: demo, query: rainfall}\n");
    let err = generate_figure(&pd, &cfg(), &CancelToken::new()).unwrap_err();
    assert!(err.to_string().contains("\"weather\""));
}

#[test]
fn computed_definition_errors() {
    let base = "datasets:\n  - {name: pops, source: demo, query: populations}\n";
    let cases = [
        // name conflict
        "computed:\n  - name: pops\n    function: diff\n    datasets:\n      - {dataset: pops, joinField: creature, valueField: month1}\n      - {dataset: pops, joinField: creature, valueField: month2}\n",
        // unknown dataset
        "computed:\n  - name: c\n    function: diff\n    datasets:\n      - {dataset: pops, joinField: creature, valueField: month1}\n      - {dataset: nope, joinField: creature, valueField: month2}\n",
        // arity
        "computed:\n  - name: c\n    function: diff\n    datasets:\n      - {dataset: pops, joinField: creature, valueField: month1}\n",
        // unknown predicate
        "computed:\n  - name: c\n    function: ratio\n    datasets:\n      - {dataset: pops, joinField: creature, valueField: month1}\n      - {dataset: pops, joinField: creature, valueField: month2}\n",
    ];
    for case in cases {
        let pd = def(&format!("{base}{case}"));
        let err = generate_figure(&pd, &cfg(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, PlotError::Configuration(_)), "{case}: {err}");
    }
}

#[test]
fn computed_across_two_datasets() {
    let pd = def(r#"
datasets:
  - name: now
    source: static
    query: "{k: [a, b, c], v: [5, 7, 9]}"
  - name: before
    source: static
    query: "{k: [b, c, d], v: [2.0, 1, 0]}"
computed:
  - name: change
    function: diff
    datasets:
      - {dataset: now, joinField: k, valueField: v}
      - {dataset: before, joinField: k, valueField: v}
series:
  - {type: bar, dataset: change, labels: key, values: value}
"#);
    let doc = generate_figure(&pd, &cfg(), &CancelToken::new()).unwrap();
    let v = serde_json::to_value(&doc).unwrap();
    assert_eq!(v["data"][0]["x"], json!(["b", "c"]));
    assert_eq!(v["data"][0]["y"], json!([5.0, 8]));
}

#[test]
fn cancelled_token_stops_before_fetching() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = generate_figure(&def(ZOO), &cfg(), &cancel).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn document_serializes_pretty_or_compact() {
    let doc = generate_figure(&def("name: empty\n"), &cfg(), &CancelToken::new()).unwrap();
    let compact = String::from_utf8(doc.to_json_bytes(true).unwrap()).unwrap();
    assert_eq!(
        compact,
        r#"{"data":[],"layout":{},"config":{},"params":{}}"#
    );
    let pretty = String::from_utf8(doc.to_json_bytes(false).unwrap()).unwrap();
    assert!(pretty.starts_with("{\n  \"data\": []"));
}

#[test]
fn partition_keeps_first_appearance_and_drops_unknown() {
    let mut datasets = DataSets::new();
    datasets.insert("a".into(), Box::new(StaticDataSet::with_fields(&["x"])));
    datasets.insert("b".into(), Box::new(StaticDataSet::with_fields(&["x"])));
    let defs = ["b", "a", "zz", "b"];
    let groups = partition_by_dataset(&defs, &datasets, "series", |d| *d);
    let shape: Vec<(&str, usize)> = groups.iter().map(|(n, m)| (*n, m.len())).collect();
    assert_eq!(shape, [("b", 2), ("a", 1)]);
}
