//! Read-only SQLite access.
//!
//! A fresh connection is opened per call so the database file can change
//! underneath the server without stale handles.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use wick::AdapterError;

use super::{HostError, MigrationLedger, Row, RowSource, SchemaInspector};
use crate::types::{ColumnInfo, ForeignKeyInfo, IndexInfo, TableSchema};

/// A parameterized `SELECT` over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub table: String,
    /// Equality filters: column and value.
    pub filters: Vec<(String, Value)>,
    /// Columns to sort by, `true` for descending.
    pub order_by: Vec<(String, bool)>,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowPage {
    pub total_count: u64,
    pub rows: Vec<Row>,
}

#[derive(Debug)]
pub struct SqliteDatabase {
    path: PathBuf,
    migrations_table: String,
    busy_timeout: Duration,
}

impl SqliteDatabase {
    /// Validate that the file opens, then keep only the path.
    pub fn open(path: &Path, migrations_table: &str, busy_timeout_ms: u64) -> Result<Self, HostError> {
        let db = Self {
            path: path.to_path_buf(),
            migrations_table: migrations_table.to_string(),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        };

        if !path.is_file() {
            return Err(HostError::Database {
                path: path.to_path_buf(),
                message: "file does not exist".to_string(),
            });
        }

        db.connect()
            .and_then(|conn| {
                conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
                    .map_err(sql_error)
            })
            .map_err(|e| HostError::Database {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, AdapterError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| AdapterError::unavailable(format!("cannot open database: {e}")))?;
        conn.busy_timeout(self.busy_timeout).map_err(sql_error)?;
        Ok(conn)
    }

    fn table_exists(conn: &Connection, table: &str) -> Result<bool, AdapterError> {
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .map_err(sql_error)?;
        Ok(count > 0)
    }

    fn columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, AdapterError> {
        let mut stmt = conn
            .prepare(r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#)
            .map_err(sql_error)?;
        let rows = stmt
            .query_map([table], |row| {
                let notnull: i64 = row.get(2)?;
                let pk: i64 = row.get(4)?;
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    column_type: row.get(1)?,
                    nullable: notnull == 0 && pk == 0,
                    primary_key: pk > 0,
                    default: row.get(3)?,
                })
            })
            .map_err(sql_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
    }

    fn indexes(conn: &Connection, table: &str) -> Result<Vec<IndexInfo>, AdapterError> {
        let mut stmt = conn
            .prepare(r#"SELECT name, "unique" FROM pragma_index_list(?1) ORDER BY name"#)
            .map_err(sql_error)?;
        let listed = stmt
            .query_map([table], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0)))
            .map_err(sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_error)?;

        let mut cols = conn
            .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
            .map_err(sql_error)?;
        let mut indexes = Vec::with_capacity(listed.len());
        for (name, unique) in listed {
            let columns = cols
                .query_map([&name], |row| row.get::<_, Option<String>>(0))
                .map_err(sql_error)?
                .filter_map(|c| c.transpose())
                .collect::<Result<Vec<_>, _>>()
                .map_err(sql_error)?;
            indexes.push(IndexInfo { name, unique, columns });
        }
        Ok(indexes)
    }

    fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyInfo>, AdapterError> {
        let mut stmt = conn
            .prepare(r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#)
            .map_err(sql_error)?;
        let rows = stmt
            .query_map([table], |row| {
                Ok(ForeignKeyInfo {
                    column: row.get(0)?,
                    references_table: row.get(1)?,
                    references_column: row.get(2)?,
                })
            })
            .map_err(sql_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_error)
    }
}

impl SchemaInspector for SqliteDatabase {
    fn tables(&self) -> Result<Vec<String>, AdapterError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(sql_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sql_error)?;
        Ok(names)
    }

    fn describe(&self, table: &str) -> Result<TableSchema, AdapterError> {
        let conn = self.connect()?;
        if !Self::table_exists(&conn, table)? {
            return Err(AdapterError::invalid_argument(format!("unknown table '{table}'")));
        }
        Ok(TableSchema {
            table: table.to_string(),
            columns: Self::columns(&conn, table)?,
            indexes: Self::indexes(&conn, table)?,
            foreign_keys: Self::foreign_keys(&conn, table)?,
        })
    }
}

impl MigrationLedger for SqliteDatabase {
    fn applied(&self) -> Result<HashSet<(String, String)>, AdapterError> {
        let conn = self.connect()?;
        if !Self::table_exists(&conn, &self.migrations_table)? {
            return Ok(HashSet::new());
        }

        let sql = format!("SELECT app, name FROM {}", quote_ident(&self.migrations_table));
        let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
        let applied = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(sql_error)?
            .collect::<Result<HashSet<_>, _>>()
            .map_err(sql_error)?;
        Ok(applied)
    }
}

impl RowSource for SqliteDatabase {
    fn query(&self, query: &RowQuery) -> Result<RowPage, AdapterError> {
        let conn = self.connect()?;
        if !Self::table_exists(&conn, &query.table)? {
            return Err(AdapterError::failed(format!(
                "table '{}' does not exist in the database",
                query.table
            )));
        }

        let table = quote_ident(&query.table);
        let mut params = Vec::with_capacity(query.filters.len() + 1);
        let mut clauses = Vec::with_capacity(query.filters.len());
        for (column, value) in &query.filters {
            params.push(bind_value(column, value)?);
            clauses.push(format!("{} IS ?{}", quote_ident(column), params.len()));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT count(*) FROM {table}{where_clause}");
        let total: i64 = conn
            .query_row(&count_sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))
            .map_err(sql_error)?;

        let order_clause = if query.order_by.is_empty() {
            String::new()
        } else {
            let terms: Vec<String> = query
                .order_by
                .iter()
                .map(|(column, desc)| {
                    format!("{} {}", quote_ident(column), if *desc { "DESC" } else { "ASC" })
                })
                .collect();
            format!(" ORDER BY {}", terms.join(", "))
        };

        params.push(SqlValue::Integer(query.limit));
        let select_sql = format!(
            "SELECT * FROM {table}{where_clause}{order_clause} LIMIT ?{}",
            params.len()
        );

        let mut stmt = conn.prepare(&select_sql).map_err(sql_error)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(sql_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(sql_error)? {
            let mut map = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = row.get_ref(i).map_err(sql_error)?;
                map.insert(name.clone(), to_json(value));
            }
            out.push(map);
        }

        Ok(RowPage {
            total_count: total.max(0) as u64,
            rows: out,
        })
    }
}

fn sql_error(e: rusqlite::Error) -> AdapterError {
    AdapterError::failed(format!("database error: {e}"))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn bind_value(column: &str, value: &Value) -> Result<SqlValue, AdapterError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(AdapterError::invalid_argument(format!(
                    "filter '{column}': number {n} is out of range"
                )))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(AdapterError::invalid_argument(format!(
            "filter '{column}' must be a scalar value"
        ))),
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, SqliteDatabase) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
CREATE TABLE auth_user (id INTEGER PRIMARY KEY, username TEXT NOT NULL);
CREATE TABLE blog_post (
    id INTEGER PRIMARY KEY,
    title VARCHAR(200) NOT NULL,
    published BOOLEAN NOT NULL DEFAULT 0,
    author_id INTEGER REFERENCES auth_user(id),
    body BLOB
);
CREATE UNIQUE INDEX blog_post_title ON blog_post (title);
CREATE TABLE django_migrations (id INTEGER PRIMARY KEY, app TEXT, name TEXT, applied TEXT);
INSERT INTO django_migrations (app, name) VALUES ('blog', '0001_initial');
INSERT INTO auth_user VALUES (1, 'ada');
INSERT INTO blog_post VALUES (1, 'first', 1, 1, x'0102');
INSERT INTO blog_post VALUES (2, 'second', 0, 1, NULL);
INSERT INTO blog_post VALUES (3, 'third', 1, NULL, NULL);
"#,
        )
        .unwrap();
        drop(conn);

        let db = SqliteDatabase::open(&path, "django_migrations", 1000).unwrap();
        (dir, db)
    }

    #[test]
    fn test_tables_sorted() {
        let (_dir, db) = fixture();
        assert_eq!(db.tables().unwrap(), vec!["auth_user", "blog_post", "django_migrations"]);
    }

    #[test]
    fn test_describe_table() {
        let (_dir, db) = fixture();
        let schema = db.describe("blog_post").unwrap();

        assert_eq!(schema.columns.len(), 5);
        let id = &schema.columns[0];
        assert!(id.primary_key);
        assert!(!id.nullable);
        let published = &schema.columns[2];
        assert_eq!(published.default.as_deref(), Some("0"));
        assert!(schema.columns[3].nullable);

        assert_eq!(schema.indexes.len(), 1);
        assert!(schema.indexes[0].unique);
        assert_eq!(schema.indexes[0].columns, vec!["title"]);

        assert_eq!(schema.foreign_keys.len(), 1);
        assert_eq!(schema.foreign_keys[0].column, "author_id");
        assert_eq!(schema.foreign_keys[0].references_table, "auth_user");
    }

    #[test]
    fn test_describe_unknown_table() {
        let (_dir, db) = fixture();
        let err = db.describe("nope").unwrap_err();
        assert_eq!(err.kind(), wick::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_applied_migrations() {
        let (_dir, db) = fixture();
        let applied = db.applied().unwrap();
        assert!(applied.contains(&("blog".to_string(), "0001_initial".to_string())));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.sqlite3");
        Connection::open(&path).unwrap().execute_batch("CREATE TABLE t (x)").unwrap();
        let empty = SqliteDatabase::open(&path, "django_migrations", 1000).unwrap();
        assert!(empty.applied().unwrap().is_empty());
    }

    #[test]
    fn test_query_filters_order_and_limit() {
        let (_dir, db) = fixture();
        let page = db
            .query(&RowQuery {
                table: "blog_post".into(),
                filters: vec![("published".into(), json!(true))],
                order_by: vec![("id".into(), true)],
                limit: 1,
            })
            .unwrap();

        assert_eq!(page.total_count, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["title"], json!("third"));
    }

    #[test]
    fn test_query_null_filter_and_blob() {
        let (_dir, db) = fixture();
        let page = db
            .query(&RowQuery {
                table: "blog_post".into(),
                filters: vec![("title".into(), json!("first"))],
                order_by: vec![],
                limit: 10,
            })
            .unwrap();
        assert_eq!(page.rows[0]["body"], json!("<blob 2 bytes>"));

        let page = db
            .query(&RowQuery {
                table: "blog_post".into(),
                filters: vec![("author_id".into(), Value::Null)],
                order_by: vec![],
                limit: 10,
            })
            .unwrap();
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_query_rejects_structured_filter() {
        let (_dir, db) = fixture();
        let err = db
            .query(&RowQuery {
                table: "blog_post".into(),
                filters: vec![("title".into(), json!(["a"]))],
                order_by: vec![],
                limit: 10,
            })
            .unwrap_err();
        assert_eq!(err.kind(), wick::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_open_missing_file() {
        let err = SqliteDatabase::open(Path::new("/nonexistent/db.sqlite3"), "m", 10).unwrap_err();
        assert!(matches!(err, HostError::Database { .. }));
    }
}
