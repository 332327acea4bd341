use super::*;
use chrono::TimeZone;
use pretty_assertions::assert_eq;

fn vars() -> TemplateVars {
    // Wednesday.
    let basis = Utc.with_ymd_and_hms(2023, 5, 10, 14, 25, 30).unwrap();
    let mut params = BTreeMap::new();
    params.insert("region".to_owned(), "north".to_owned());
    params.insert("title".to_owned(), "{{ literal }}".to_owned());
    TemplateVars::new(basis).with_params(params)
}

#[test]
fn time_variables_render_as_rfc3339() {
    let out = render(
        "a: {{ .Now }}\nb: {{.StartOfHour}}\nc: {{ StartOfDay }}\nd: {{ .StartOfWeek }}",
        &vars(),
    )
    .unwrap();
    assert_eq!(
        out,
        "a: 2023-05-10T14:25:30Z\nb: 2023-05-10T14:00:00Z\nc: 2023-05-10T00:00:00Z\nd: 2023-05-08T00:00:00Z"
    );
}

#[test]
fn previous_period_boundaries() {
    let v = vars();
    assert_eq!(
        render("{{ .EndOfPreviousHour }}", &v).unwrap(),
        "2023-05-10T13:59:59Z"
    );
    assert_eq!(
        render("{{ .EndOfPreviousDay }}", &v).unwrap(),
        "2023-05-09T23:59:59Z"
    );
    assert_eq!(
        render("{{ .EndOfPreviousWeek }}", &v).unwrap(),
        "2023-05-07T23:59:59Z"
    );
    assert_eq!(
        render("{{ .StartOfPreviousWeek }}", &v).unwrap(),
        "2023-05-01T00:00:00Z"
    );
}

#[test]
fn formatters() {
    let v = vars();
    assert_eq!(render("{{ .StartOfDay | simpledate }}", &v).unwrap(), "10 May 2023");
    assert_eq!(render("{{ .Now | date }}", &v).unwrap(), "2023-05-10");
    assert_eq!(
        render("{{ Now | date(format=\"%d/%m\") }}", &v).unwrap(),
        "10/05"
    );
    assert_eq!(render("{{ .Now | isodate }}", &v).unwrap(), "2023-05-10T14:25:30Z");
    assert_eq!(
        render("{{ .StartOfHour | timestamp }}", &v).unwrap(),
        "'2023-05-10 14:00:00'::timestamp"
    );
    assert_eq!(
        render("{{ .StartOfHour | timestamptz }}", &v).unwrap(),
        "'2023-05-10 14:00:00 Z'::timestamptz"
    );
    assert_eq!(render("{{ .StartOfDay | unix }}", &v).unwrap(), "1683676800");
}

#[test]
fn chained_modifiers_in_go_template_form() {
    let v = vars();
    assert_eq!(
        render("q: {{ .StartOfDay | dayModify \"-7\" | timestamptz }}", &v).unwrap(),
        "q: '2023-05-03 00:00:00 Z'::timestamptz"
    );
    assert_eq!(
        render("{{ .StartOfWeek | weekModify \"2\" | date }}", &v).unwrap(),
        "2023-05-22"
    );
    assert_eq!(
        render("{{ .StartOfDay | monthModify \"-3\" | date }}", &v).unwrap(),
        "2023-02-10"
    );
}

#[test]
fn modifiers_in_tera_form() {
    let v = vars();
    assert_eq!(
        render("{{ StartOfDay | dayModify(n=1) | date }}", &v).unwrap(),
        "2023-05-11"
    );
    assert_eq!(
        render("{{ StartOfDay | monthModify(n=\"x\") | date }}", &v).unwrap(),
        "2023-05-10"
    );
}

#[test]
fn month_modify_clamps_to_month_end() {
    let basis = Utc.with_ymd_and_hms(2023, 1, 31, 0, 0, 0).unwrap();
    assert_eq!(
        render("{{ .Now | monthModify \"1\" | date }}", &TemplateVars::new(basis)).unwrap(),
        "2023-02-28"
    );
}

#[test]
fn string_helpers() {
    let v = vars();
    assert_eq!(render("{{ .Params.region | toUpper }}", &v).unwrap(), "NORTH");
    assert_eq!(render("{{ .Params.region | toTitle }}", &v).unwrap(), "NORTH");
}

#[test]
fn params_are_substituted() {
    assert_eq!(
        render("where region = '{{ .Params.region }}'", &vars()).unwrap(),
        "where region = 'north'"
    );
}

#[test]
fn param_values_are_not_reparsed() {
    assert_eq!(
        render("title: \"{{ .Params.title }}\"", &vars()).unwrap(),
        "title: \"{{ literal }}\""
    );
}

#[test]
fn control_flow_is_available() {
    let src = "{% if Params.region == \"north\" %}n{% else %}s{% endif %}";
    assert_eq!(render(src, &vars()).unwrap(), "n");
}

#[test]
fn text_without_placeholders_is_unchanged() {
    let src = "name: plain\nlayout: {a: {b: 1}}\ncolor: '#ff0000'";
    assert_eq!(render(src, &vars()).unwrap(), src);
}

#[test]
fn bad_templates_are_configuration_errors() {
    for src in [
        "{{ .Tomorrow }}",
        "{{ .Params.missing }}",
        "{{ .Now | shout }}",
        "{{ .Now.Year }}",
        "{{ .Params.region | dayModify \"1\" }}",
        "{{ .Now | dayModify }}",
        "{{ .Now | dayModify \"999999999999\" }}",
        "{{ range .Items }}",
        "{{ unclosed",
    ] {
        assert!(
            matches!(render(src, &vars()), Err(PlotError::Configuration(_))),
            "{src}"
        );
    }
}
