use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// Scalar cell value covering the SQLite storage classes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Project into JSON. Blobs are rendered as lossy UTF-8 text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Value::from(*r),
            Value::Text(s) => serde_json::Value::from(s.clone()),
            Value::Blob(b) => serde_json::Value::from(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(v: rusqlite::types::Value) -> Self {
        match v {
            rusqlite::types::Value::Null => Value::Null,
            rusqlite::types::Value::Integer(i) => Value::Integer(i),
            rusqlite::types::Value::Real(r) => Value::Real(r),
            rusqlite::types::Value::Text(s) => Value::Text(s),
            rusqlite::types::Value::Blob(b) => Value::Blob(b),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_rust_scalars() {
        assert_eq!(Value::from(7), Value::Integer(7));
        assert_eq!(Value::from(7i64), Value::Integer(7));
        assert_eq!(Value::from(1.5), Value::Real(1.5));
        assert_eq!(Value::from(true), Value::Integer(1));
        assert_eq!(Value::from("hi"), Value::Text("hi".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn converts_sqlite_values() {
        let v: Value = rusqlite::types::Value::Integer(3).into();
        assert_eq!(v, Value::Integer(3));
        let v: Value = rusqlite::types::Value::Null.into();
        assert!(v.is_null());
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::Integer(2).as_integer(), Some(2));
        assert_eq!(Value::Text("a".into()).as_integer(), None);
        assert_eq!(Value::Real(0.5).as_real(), Some(0.5));
        assert_eq!(Value::Text("a".into()).as_text(), Some("a"));
    }

    #[test]
    fn projects_to_json() {
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Integer(4).to_json(), serde_json::json!(4));
        assert_eq!(Value::Text("t".into()).to_json(), serde_json::json!("t"));
        assert_eq!(
            Value::Blob(b"raw".to_vec()).to_json(),
            serde_json::json!("raw")
        );
    }
}
