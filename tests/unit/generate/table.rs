use super::*;
use crate::data::dataset::StaticDataSet;
use crate::definition::model::PlotDef;
use serde_json::json;

fn grid(rows: &[(&str, &str, f64)]) -> DataSets {
    let ds = StaticDataSet::from_columns(vec![
        ("x".to_owned(), rows.iter().map(|r| r.0.into()).collect()),
        ("y".to_owned(), rows.iter().map(|r| r.1.into()).collect()),
        ("v".to_owned(), rows.iter().map(|r| FieldValue::Float(r.2)).collect()),
    ])
    .unwrap();
    let mut sets = DataSets::new();
    sets.insert("grid".to_owned(), Box::new(ds));
    sets
}

fn tables(doc: &str) -> Vec<TableDef> {
    PlotDef::parse("t.yaml", doc).unwrap().tables
}

const HEATMAP: &str = "tables:\n  - {type: heatmap, name: corr, dataset: grid, labelsX: x, labelsY: y, values: v, colorbar: {title: r}}\n";

#[test]
fn heatmap_is_dense_with_nulls_for_missing_cells() {
    let mut sets = grid(&[("a", "p", 1.0), ("b", "p", 0.5), ("a", "q", 0.25)]);
    let (traces, annotations) = table_traces(&mut sets, &tables(HEATMAP)).unwrap();
    let t = serde_json::to_value(&traces[0]).unwrap();

    assert_eq!(t["type"], "heatmap");
    assert_eq!(t["x"], json!(["a", "b"]));
    assert_eq!(t["y"], json!(["p", "q"]));
    assert_eq!(t["z"], json!([[1.0, 0.5], [0.25, null]]));
    assert_eq!(t["colorscale"], "Viridis");
    assert_eq!(t["reversescale"], true);
    assert_eq!(t["colorbar"], json!({"title": "r"}));

    let texts: Vec<&str> = annotations.iter().map(|a| a.text.as_str()).collect();
    assert_eq!(texts, ["1.000", "0.500", "0.250", ""]);
    assert_eq!(
        serde_json::to_value(&annotations[1]).unwrap(),
        json!({"xref": "x1", "yref": "y1", "x": "b", "y": "p", "text": "0.500", "showarrow": false})
    );
}

#[test]
fn duplicate_cell_is_a_configuration_error() {
    let mut sets = grid(&[("a", "p", 1.0), ("a", "p", 2.0)]);
    let err = table_traces(&mut sets, &tables(HEATMAP)).unwrap_err();
    assert!(matches!(err, PlotError::Configuration(_)));
    assert!(err.to_string().contains("a/p"));
    assert!(err.to_string().contains("\"corr\""));
}

#[test]
fn unknown_dataset_or_field_skips_table() {
    let mut sets = grid(&[("a", "p", 1.0)]);
    let defs = tables(
        "tables:\n  - {type: heatmap, name: t1, dataset: nowhere, labelsX: x, labelsY: y, values: v}\n  - {type: heatmap, name: t2, dataset: grid, labelsX: x, labelsY: z, values: v}\n  - {type: heatmap, name: t3, dataset: grid, labelsX: x, labelsY: y, values: v}\n",
    );
    let (traces, annotations) = table_traces(&mut sets, &defs).unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].name(), "t3");
    assert_eq!(annotations.len(), 1);
}
