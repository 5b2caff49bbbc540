use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params_from_iter, Connection};

use crate::error::{EmberError, Result};
use crate::query::{quote_ident, SelectQuery};
use crate::value::Value;

/// Thin wrapper over a SQLite connection.
///
/// Higher layers never touch `rusqlite` directly; everything flows through
/// `SelectQuery` or the keyed write helpers here.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Database { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database { conn })
    }

    /// Run caller-owned DDL. Table creation stays in application hands.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Column names of `table` in declaration order.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns: Vec<String> = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<_, _>>()?;
        if columns.is_empty() {
            return Err(EmberError::Schema(format!(
                "table '{table}' does not exist or has no columns"
            )));
        }
        Ok(columns)
    }

    pub fn select(&self, query: &SelectQuery) -> Result<Vec<BTreeMap<String, Value>>> {
        let (sql, params) = query.to_sql();
        let mut stmt = self.conn.prepare(&sql)?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|n| n.to_string()).collect();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut record = BTreeMap::new();
            for (i, name) in column_names.iter().enumerate() {
                let cell: rusqlite::types::Value = row.get(i)?;
                record.insert(name.clone(), Value::from(cell));
            }
            Ok(record)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert `data` into `table` and return the new rowid.
    pub fn insert(&self, table: &str, data: &[(String, Value)]) -> Result<i64> {
        if data.is_empty() {
            let sql = format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
            self.conn.execute(&sql, [])?;
            return Ok(self.conn.last_insert_rowid());
        }
        let columns: Vec<String> = data.iter().map(|(k, _)| quote_ident(k)).collect();
        let marks: Vec<String> = (1..=data.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            marks.join(", ")
        );
        let params: Vec<&Value> = data.iter().map(|(_, v)| v).collect();
        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update the row of `table` whose `key` column equals `id`.
    /// Returns whether a row matched.
    pub fn update_by_key(
        &self,
        table: &str,
        key: &str,
        id: &Value,
        data: &[(String, Value)],
    ) -> Result<bool> {
        if data.is_empty() {
            return Ok(false);
        }
        let assignments: Vec<String> = data
            .iter()
            .enumerate()
            .map(|(i, (k, _))| format!("{} = ?{}", quote_ident(k), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(table),
            assignments.join(", "),
            quote_ident(key),
            data.len() + 1
        );
        let mut params: Vec<&Value> = data.iter().map(|(_, v)| v).collect();
        params.push(id);
        let changed = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(changed > 0)
    }

    /// Delete the row of `table` whose `key` column equals `id`.
    /// Returns whether a row matched.
    pub fn delete_by_key(&self, table: &str, key: &str, id: &Value) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(key)
        );
        let changed = self.conn.execute(&sql, [id])?;
        Ok(changed > 0)
    }
}
