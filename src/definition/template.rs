use std::collections::{BTreeMap, HashMap};
use std::error::Error as _;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, Months, TimeDelta, Utc};
use regex::{Captures, Regex};
use tera::{Context, Tera, Value};

use crate::foundation::core::{format_rfc3339, start_of_day, start_of_hour, start_of_week};
use crate::foundation::error::{PlotError, PlotResult};

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{.*?\}\}").unwrap_or_else(|e| panic!("action regex: {e}"))
});

static DOT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[\s({|-])\.([A-Za-z])").unwrap_or_else(|e| panic!("dot regex: {e}"))
});

static PIPE_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\|\s*([A-Za-z]+)\s+("[^"]*"|-?[0-9]+)"#)
        .unwrap_or_else(|e| panic!("pipe regex: {e}"))
});

const TIME_VARS: [&str; 8] = [
    "Now",
    "StartOfHour",
    "StartOfDay",
    "StartOfWeek",
    "EndOfPreviousHour",
    "EndOfPreviousDay",
    "EndOfPreviousWeek",
    "StartOfPreviousWeek",
];

/// Values available to templates in definition files.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub basis: DateTime<Utc>,
    pub params: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new(basis: DateTime<Utc>) -> Self {
        Self {
            basis,
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    fn time(&self, var: &str) -> Option<DateTime<Utc>> {
        let b = self.basis;
        let week = TimeDelta::weeks(1);
        let tick = TimeDelta::nanoseconds(1);
        Some(match var {
            "Now" => b,
            "StartOfHour" => start_of_hour(b),
            "StartOfDay" => start_of_day(b),
            "StartOfWeek" => start_of_week(b),
            "EndOfPreviousHour" => start_of_hour(b) - tick,
            "EndOfPreviousDay" => start_of_day(b) - tick,
            "EndOfPreviousWeek" => start_of_week(b) - tick,
            "StartOfPreviousWeek" => start_of_week(b) - week,
            _ => return None,
        })
    }

    /// Time variables as RFC 3339 strings plus the `Params` map.
    fn context(&self) -> Context {
        let mut ctx = Context::new();
        for var in TIME_VARS {
            if let Some(t) = self.time(var) {
                ctx.insert(var, &format_rfc3339(t));
            }
        }
        ctx.insert("Params", &self.params);
        ctx
    }
}

/// Render a definition file through tera.
///
/// Go-template style actions such as `{{ .StartOfDay | dayModify "-7" }}` are
/// accepted and rewritten to `{{ StartOfDay | dayModify(n="-7") }}` first.
/// Parameter values are inserted as data and never re-parsed.
pub fn render(source: &str, vars: &TemplateVars) -> PlotResult<String> {
    let source = ACTION.replace_all(source, |caps: &Captures<'_>| {
        let action = DOT_REF.replace_all(&caps[0], "${1}${2}");
        PIPE_ARG
            .replace_all(&action, "| ${1}(n=${2})")
            .into_owned()
    });
    engine()
        .render_str(&source, &vars.context())
        .map_err(template_error)
}

fn engine() -> Tera {
    let mut tera = Tera::default();
    tera.register_filter("isodate", isodate);
    tera.register_filter("simpledate", simpledate);
    tera.register_filter("date", date);
    tera.register_filter("timestamp", timestamp);
    tera.register_filter("timestamptz", timestamptz);
    tera.register_filter("unix", unix);
    tera.register_filter("dayModify", day_modify);
    tera.register_filter("weekModify", week_modify);
    tera.register_filter("monthModify", month_modify);
    tera.register_filter("toUpper", to_upper);
    tera.register_filter("toTitle", to_title);
    tera
}

type Args = HashMap<String, Value>;

fn isodate(v: &Value, _: &Args) -> tera::Result<Value> {
    Ok(Value::from(format_rfc3339(time_arg(v, "isodate")?)))
}

fn simpledate(v: &Value, _: &Args) -> tera::Result<Value> {
    let t = time_arg(v, "simpledate")?;
    Ok(Value::from(t.format("%-d %b %Y").to_string()))
}

fn date(v: &Value, args: &Args) -> tera::Result<Value> {
    let t = time_arg(v, "date")?;
    let format = match args.get("format") {
        Some(f) => f
            .as_str()
            .ok_or_else(|| tera::Error::msg("filter `date`: `format` must be a string"))?,
        None => "%Y-%m-%d",
    };
    let mut out = String::new();
    write!(out, "{}", t.format(format))
        .map_err(|_| tera::Error::msg(format!("filter `date`: bad format {format:?}")))?;
    Ok(Value::from(out))
}

fn timestamp(v: &Value, _: &Args) -> tera::Result<Value> {
    let t = time_arg(v, "timestamp")?;
    Ok(Value::from(format!("'{}'::timestamp", t.format("%Y-%m-%d %H:%M:%S"))))
}

fn timestamptz(v: &Value, _: &Args) -> tera::Result<Value> {
    let t = time_arg(v, "timestamptz")?;
    Ok(Value::from(format!(
        "'{}'::timestamptz",
        t.format("%Y-%m-%d %H:%M:%S Z")
    )))
}

fn unix(v: &Value, _: &Args) -> tera::Result<Value> {
    Ok(Value::from(time_arg(v, "unix")?.timestamp()))
}

fn day_modify(v: &Value, args: &Args) -> tera::Result<Value> {
    modify(v, args, "dayModify", |t, n| {
        TimeDelta::try_days(n).and_then(|d| t.checked_add_signed(d))
    })
}

fn week_modify(v: &Value, args: &Args) -> tera::Result<Value> {
    modify(v, args, "weekModify", |t, n| {
        TimeDelta::try_weeks(n).and_then(|d| t.checked_add_signed(d))
    })
}

/// Calendar months; the day is clamped to the end of a shorter month.
fn month_modify(v: &Value, args: &Args) -> tera::Result<Value> {
    modify(v, args, "monthModify", |t, n| {
        let months = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
        if n < 0 {
            t.checked_sub_months(months)
        } else {
            t.checked_add_months(months)
        }
    })
}

fn to_upper(v: &Value, _: &Args) -> tera::Result<Value> {
    Ok(Value::from(string_arg(v, "toUpper")?.to_uppercase()))
}

// Title case of a single letter is its upper case form for nearly every script.
fn to_title(v: &Value, _: &Args) -> tera::Result<Value> {
    Ok(Value::from(string_arg(v, "toTitle")?.to_uppercase()))
}

/// Shift a time value by the `n` argument; a non-integer `n` leaves it as is.
fn modify(
    v: &Value,
    args: &Args,
    filter: &str,
    shift: impl Fn(DateTime<Utc>, i64) -> Option<DateTime<Utc>>,
) -> tera::Result<Value> {
    let t = time_arg(v, filter)?;
    let n = match args.get("n") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
        None => {
            return Err(tera::Error::msg(format!(
                "filter `{filter}` needs an `n` argument"
            )));
        }
    };
    let Some(n) = n else {
        return Ok(Value::from(format_rfc3339(t)));
    };
    let shifted = shift(t, n)
        .ok_or_else(|| tera::Error::msg(format!("filter `{filter}`: {n} is out of range")))?;
    Ok(Value::from(format_rfc3339(shifted)))
}

fn time_arg(v: &Value, filter: &str) -> tera::Result<DateTime<Utc>> {
    v.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| tera::Error::msg(format!("filter `{filter}` expects a time value, got {v}")))
}

fn string_arg<'a>(v: &'a Value, filter: &str) -> tera::Result<&'a str> {
    v.as_str()
        .ok_or_else(|| tera::Error::msg(format!("filter `{filter}` expects a string, got {v}")))
}

// tera keeps the useful detail in the source chain.
fn template_error(e: tera::Error) -> PlotError {
    let mut msg = e.to_string();
    let mut cause = e.source();
    while let Some(c) = cause {
        msg.push_str(": ");
        msg.push_str(&c.to_string());
        cause = c.source();
    }
    PlotError::configuration(msg)
}

#[cfg(test)]
#[path = "../../tests/unit/definition/template.rs"]
mod tests;
