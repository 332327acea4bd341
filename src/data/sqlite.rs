//! `SQLite`-backed [`DataSource`].
//!
//! The connection is opened lazily on first use and shared behind a `Mutex`. The outcome of
//! opening it, success or failure, is cached: a source whose database cannot be opened fails
//! every query with the same error and never retries.
//!
//! Text stored in columns declared as `DATE`, `DATETIME` or `TIMESTAMP` is read back as a
//! timestamp when it parses; anything else stays text.

use std::sync::{Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::data::dataset::{DataSet, StaticDataSet};
use crate::data::source::DataSource;
use crate::data::value::FieldValue;
use crate::foundation::core::format_rfc3339;
use crate::foundation::error::{PlotError, PlotResult};

const IN_MEMORY: &str = ":memory:";

pub struct SqliteDataSource {
    path: String,
    conn: OnceLock<Result<Mutex<Connection>, String>>,
}

impl SqliteDataSource {
    /// Create a source for the database at `path` (`:memory:` for a private in-memory db).
    ///
    /// Nothing is opened until the first query.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: OnceLock::new(),
        }
    }

    /// Create a source around an already-open connection (fixtures, tests).
    pub fn from_connection(conn: Connection) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Mutex::new(conn)));
        Self {
            path: String::new(),
            conn: cell,
        }
    }

    fn open(&self) -> Result<Mutex<Connection>, String> {
        tracing::debug!(path = %self.path, "opening sqlite database");
        let conn = if self.path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        };
        conn.map(Mutex::new)
            .map_err(|e| format!("unable to open database {:?}: {e}", self.path))
    }

    fn lock_conn(&self) -> PlotResult<MutexGuard<'_, Connection>> {
        let conn = self
            .conn
            .get_or_init(|| self.open())
            .as_ref()
            .map_err(|e| PlotError::data_access(e.clone()))?;
        conn.lock()
            .map_err(|_| PlotError::data_access("sqlite connection lock poisoned"))
    }

    /// Run statements that return no rows, e.g. to seed fixture tables.
    pub fn execute_batch(&self, sql: &str) -> PlotResult<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(sql)
            .map_err(|e| PlotError::data_access(format!("execute batch: {e}")))
    }
}

impl std::fmt::Debug for SqliteDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDataSource")
            .field("path", &self.path)
            .field("initialized", &self.conn.get().is_some())
            .finish()
    }
}

impl DataSource for SqliteDataSource {
    fn get_dataset(&self, query: &str, params: &[FieldValue]) -> PlotResult<Box<dyn DataSet>> {
        let bind = params.iter().map(to_sql).collect::<PlotResult<Vec<_>>>()?;

        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(query)
            .map_err(|e| PlotError::data_access(format!("prepare query: {e}")))?;
        let (names, time_cols): (Vec<String>, Vec<bool>) = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_owned(), c.decl_type().is_some_and(is_time_decl)))
            .unzip();

        let mut ds = StaticDataSet::with_fields(&names);
        let mut rows = stmt
            .query(rusqlite::params_from_iter(bind.iter()))
            .map_err(|e| PlotError::data_access(format!("execute query: {e}")))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| PlotError::data_access(format!("collect rows: {e}")))?
        {
            let mut values = Vec::with_capacity(names.len());
            for i in 0..names.len() {
                let v = row
                    .get_ref(i)
                    .map_err(|e| PlotError::data_access(format!("read row values: {e}")))?;
                values.push(from_sql(v, time_cols[i]));
            }
            ds.push_row(values)?;
        }
        Ok(Box::new(ds))
    }
}

fn to_sql(v: &FieldValue) -> PlotResult<SqlValue> {
    Ok(match v {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
        FieldValue::Int(i) => SqlValue::Integer(*i),
        FieldValue::Float(f) => SqlValue::Real(*f),
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Timestamp(t) => SqlValue::Text(format_rfc3339(*t)),
        FieldValue::Duration(_) => SqlValue::Real(v.as_f64().unwrap_or_default()),
        FieldValue::Error(e) => {
            return Err(PlotError::configuration(format!(
                "cannot bind an error value as a query parameter: {e}"
            )));
        }
    })
}

fn from_sql(v: ValueRef<'_>, time_col: bool) -> FieldValue {
    match v {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) => FieldValue::Int(i),
        ValueRef::Real(f) => FieldValue::Float(f),
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes);
            match time_col.then(|| parse_time(&s)).flatten() {
                Some(t) => FieldValue::Timestamp(t),
                None => FieldValue::Text(s.into_owned()),
            }
        }
        ValueRef::Blob(_) => FieldValue::Error("blob columns are not supported".to_owned()),
    }
}

fn is_time_decl(decl: &str) -> bool {
    let decl = decl.to_ascii_uppercase();
    decl.starts_with("DATE") || decl.starts_with("TIMESTAMP")
}

/// The text layouts SQLite's own date functions produce, plus RFC 3339.
fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|t| t.and_utc())
}
