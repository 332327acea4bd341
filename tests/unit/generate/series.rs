use super::*;
use crate::data::dataset::StaticDataSet;
use crate::definition::color::ColorDoc;
use crate::definition::model::PlotDef;
use serde_json::json;

fn readings() -> DataSets {
    let ds = StaticDataSet::from_columns(vec![
        (
            "site".to_owned(),
            vec!["north".into(), "south".into(), "east".into(), "north".into(), "south".into()],
        ),
        (
            "day".to_owned(),
            vec!["mon".into(), "mon".into(), "mon".into(), "tue".into(), "tue".into()],
        ),
        (
            "temp".to_owned(),
            [3, 8, 5, 4, 9].into_iter().map(FieldValue::Int).collect(),
        ),
    ])
    .unwrap();
    let mut sets = DataSets::new();
    sets.insert("readings".to_owned(), Box::new(ds));
    sets
}

fn series(doc: &str) -> Vec<SeriesDef> {
    PlotDef::parse("s.yaml", doc).unwrap().series
}

fn colors() -> ColorTable {
    ColorTable::from_doc(ColorDoc {
        default: String::new(),
        colors: serde_yaml::from_str("[{name: ocean, color: '#1f77b4'}]").unwrap(),
    })
}

fn traces(doc: &str) -> Vec<serde_json::Value> {
    series_traces(&mut readings(), &series(doc), &colors())
        .unwrap()
        .iter()
        .map(|t| serde_json::to_value(t).unwrap())
        .collect()
}

#[test]
fn wildcard_group_fans_out_one_trace_per_value() {
    let out = traces(
        "series:\n  - {type: bar, name: temp, dataset: readings, labels: day, values: temp, groupfield: site, groupvalue: '*'}\n",
    );
    let names: Vec<&str> = out.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["temp-east", "temp-north", "temp-south"]);

    let total: usize = out.iter().map(|t| t["y"].as_array().unwrap().len()).sum();
    assert_eq!(total, 5);
    assert_eq!(out[1]["x"], json!(["mon", "tue"]));
    assert_eq!(out[1]["y"], json!([3, 4]));
}

#[test]
fn wildcard_without_base_name_uses_group_value() {
    let out = traces(
        "series:\n  - {type: line, dataset: readings, values: temp, groupfield: site, groupvalue: '*'}\n",
    );
    assert_eq!(out[0]["name"], "east");
    assert_eq!(out.len(), 3);
}

#[test]
fn fixed_group_value_filters_rows() {
    let out = traces(
        "series:\n  - {type: bar, name: south, dataset: readings, labels: day, values: temp, groupfield: site, groupvalue: south}\n",
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["y"], json!([8, 9]));
}

#[test]
fn declaration_order_wins_over_name() {
    let out = traces(
        "series:\n  - {type: bar, name: zeta, dataset: readings, values: temp}\n  - {type: bar, name: alpha, dataset: readings, values: temp}\n",
    );
    assert_eq!(out[0]["name"], "zeta");
    assert_eq!(out[1]["name"], "alpha");
}

#[test]
fn shapes() {
    let out = traces(
        r##"
series:
  - {type: hbar, name: h, dataset: readings, labels: day, values: temp, color: ocean, hovertemplate: "%{x}"}
  - {type: line, name: l, dataset: readings, labels: day, values: temp, marker: circle, fill: tozero, color: "#ff0000"}
  - {type: box, name: b, dataset: readings, values: temp}
  - {type: hbox, name: hb, dataset: readings, values: temp}
"##,
    );
    assert_eq!(out[0]["type"], "bar");
    assert_eq!(out[0]["orientation"], "h");
    assert_eq!(out[0]["x"], json!([3, 8, 5, 4, 9]));
    assert_eq!(out[0]["marker"], json!({"color": "#1f77b4"}));
    assert_eq!(out[0]["hovertemplate"], "%{x}");

    assert_eq!(out[1]["type"], "scatter");
    assert_eq!(out[1]["mode"], "lines+markers");
    assert_eq!(out[1]["fill"], "tozeroy");
    assert_eq!(out[1]["marker"], json!({"color": "#ff0000", "symbol": "circle"}));

    assert_eq!(out[2]["type"], "box");
    assert!(out[2].get("x").is_none());
    assert_eq!(out[2]["y"].as_array().unwrap().len(), 5);
    assert!(out[2].get("marker").is_none());

    assert_eq!(out[3]["x"].as_array().unwrap().len(), 5);
    assert!(out[3].get("y").is_none());
}

#[test]
fn plain_line_has_empty_marker() {
    let out = traces("series:\n  - {type: line, name: l, dataset: readings, values: temp}\n");
    assert_eq!(out[0]["mode"], "lines");
    assert!(out[0].get("fill").is_none());
    assert_eq!(out[0]["marker"], json!({}));
    assert_eq!(out[0]["x"], json!([]));
}

#[test]
fn uncolored_series_use_the_default_color() {
    let table = ColorTable::from_doc(ColorDoc {
        default: "ocean".to_owned(),
        colors: serde_yaml::from_str("[{name: ocean, color: '#1f77b4'}]").unwrap(),
    });
    let defs = series(
        "series:\n  - {type: bar, name: a, dataset: readings, values: temp}\n  - {type: bar, name: b, dataset: readings, values: temp, color: red}\n",
    );
    let out: Vec<serde_json::Value> = series_traces(&mut readings(), &defs, &table)
        .unwrap()
        .iter()
        .map(|t| serde_json::to_value(t).unwrap())
        .collect();
    assert_eq!(out[0]["marker"], json!({"color": "#1f77b4"}));
    assert_eq!(out[1]["marker"], json!({"color": "red"}));
}

#[test]
fn unknown_dataset_or_field_skips_only_that_series() {
    let out = traces(
        r#"
series:
  - {type: bar, name: ghost, dataset: missing, values: temp}
  - {type: bar, name: typo, dataset: readings, values: tmep}
  - {type: bar, name: ok, dataset: readings, values: temp}
"#,
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["name"], "ok");
}

#[test]
fn iteration_error_aborts() {
    let ds = StaticDataSet::from_columns(vec![("v".to_owned(), vec![FieldValue::Int(1)])])
        .unwrap()
        .fail_at_end("connection reset");
    let mut sets = DataSets::new();
    sets.insert("d".to_owned(), Box::new(ds));
    let defs = series("series:\n  - {type: bar, dataset: d, values: v}\n");
    let err = series_traces(&mut sets, &defs, &colors()).unwrap_err();
    assert!(err.to_string().contains("connection reset"));
}
