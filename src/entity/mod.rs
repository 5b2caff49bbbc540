use std::collections::{BTreeMap, HashMap, HashSet};

use crate::base::Base;
use crate::error::Result;
use crate::query::SelectQuery;
use crate::record::{Field, Record, Row};
use crate::relation::{fetch_resolved, Relationships, ResolveCtx};
use crate::value::Value;

/// Everything the runtime knows about one registered entity.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub table: String,
    pub primary_key: String,
    /// Every column of the backing table, in declaration order.
    pub field_names: Vec<String>,
    /// Columns writable through `add`/`update`: all fields except the key.
    pub allowed_fields: Vec<String>,
    pub singular_name: String,
    pub relationships: Relationships,
    pub(crate) finders: HashSet<String>,
}

/// One search condition: match a single value, or any of several.
#[derive(Debug, Clone)]
pub enum Criterion {
    One(Value),
    Any(Vec<Value>),
}

/// Source of user-supplied field values for `populate`.
pub trait InputSource {
    fn value(&self, field: &str) -> Option<Value>;
}

impl InputSource for HashMap<String, Value> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl InputSource for BTreeMap<String, Value> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

/// Borrowed handle on a registered entity. Cheap to copy; all state lives
/// in the owning `Base`.
#[derive(Clone, Copy)]
pub struct Entity<'a> {
    pub(crate) base: &'a Base,
    pub(crate) descriptor: &'a EntityDescriptor,
}

impl<'a> std::fmt::Debug for Entity<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("descriptor", self.descriptor)
            .finish()
    }
}

impl<'a> Entity<'a> {
    pub fn table(&self) -> &str {
        &self.descriptor.table
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        self.descriptor
    }

    /// Fetch one record by key with all declared relationships attached.
    pub fn get(&self, id: impl Into<Value>) -> Result<Option<Row<'a>>> {
        let id = id.into();
        let mut ctx = ResolveCtx::new();
        let record = fetch_resolved(self.base, self.descriptor, &id, &mut ctx)?;
        Ok(record.map(|record| Row {
            base: self.base,
            descriptor: self.descriptor,
            record,
        }))
    }

    /// Fetch every record matching the ANDed equality `conditions`,
    /// each fully resolved. `None` when nothing matches.
    pub fn get_list(
        &self,
        conditions: &[(&str, Value)],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Option<Vec<Row<'a>>>> {
        let mut query = SelectQuery::new(&self.descriptor.table)
            .columns(&[self.descriptor.primary_key.as_str()]);
        for (field, value) in conditions {
            query = query.filter_eq(field, value.clone());
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        if let Some(offset) = offset {
            query = query.offset(offset);
        }
        let rows = self.fetch_each(query)?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows))
    }

    /// Single-condition form of `get_list`.
    pub fn get_by(&self, field: &str, value: impl Into<Value>) -> Result<Option<Vec<Row<'a>>>> {
        self.get_list(&[(field, value.into())], None, None)
    }

    /// Finder dispatch: `get_by` when `field` is a known column, a logged
    /// no-op otherwise.
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> Result<Option<Vec<Row<'a>>>> {
        if !self.descriptor.finders.contains(field) {
            log::debug!(
                "find_by '{field}' on '{}' matches no column, returning nothing",
                self.descriptor.table
            );
            return Ok(None);
        }
        self.get_by(field, value)
    }

    /// Insert a record and return its new key. Fields outside the entity's
    /// writable set are dropped.
    pub fn add<K: AsRef<str>>(&self, data: &[(K, Value)]) -> Result<i64> {
        let data = self.filter_allowed(data);
        self.base.db.insert(&self.descriptor.table, &data)
    }

    /// Update the record with key `id`. Returns whether a row matched;
    /// an all-filtered payload updates nothing.
    pub fn update<K: AsRef<str>>(&self, id: impl Into<Value>, data: &[(K, Value)]) -> Result<bool> {
        let data = self.filter_allowed(data);
        if data.is_empty() {
            return Ok(false);
        }
        self.base.db.update_by_key(
            &self.descriptor.table,
            &self.descriptor.primary_key,
            &id.into(),
            &data,
        )
    }

    /// Delete the record with key `id`. A null key deletes nothing.
    pub fn delete(&self, id: impl Into<Value>) -> Result<bool> {
        let id = id.into();
        if id.is_null() {
            return Ok(false);
        }
        self.base
            .db
            .delete_by_key(&self.descriptor.table, &self.descriptor.primary_key, &id)
    }

    /// Search by field criteria, optionally excluding a set of keys.
    ///
    /// Multi-valued criteria become an OR group; criteria naming unknown
    /// columns are skipped. Matches come back fully resolved.
    pub fn search(
        &self,
        criteria: &[(&str, Criterion)],
        exclude: Option<&[Value]>,
    ) -> Result<Vec<Row<'a>>> {
        let mut query = SelectQuery::new(&self.descriptor.table)
            .columns(&[self.descriptor.primary_key.as_str()]);
        if let Some(exclude) = exclude {
            if !exclude.is_empty() {
                query = query.filter_not_in(&self.descriptor.primary_key, exclude.to_vec());
            }
        }
        for (field, criterion) in criteria {
            if !self.descriptor.field_names.iter().any(|f| f == field) {
                log::debug!(
                    "search criterion '{field}' on '{}' matches no column, skipped",
                    self.descriptor.table
                );
                continue;
            }
            query = match criterion {
                Criterion::One(value) => query.filter_eq(field, value.clone()),
                Criterion::Any(values) => query.filter_any_of(field, values.clone()),
            };
        }
        self.fetch_each(query)
    }

    /// Build a record from an input source, one entry per writable field.
    /// Absent fields default to the empty string.
    pub fn populate(&self, source: &dyn InputSource) -> Record {
        let mut record = Record::new();
        for field in &self.descriptor.allowed_fields {
            let value = source
                .value(field)
                .unwrap_or_else(|| Value::Text(String::new()));
            record.insert(field.clone(), Field::Scalar(value));
        }
        record
    }

    /// Run a key-only query and re-fetch each match through `get` so
    /// every returned row carries its attachments.
    fn fetch_each(&self, query: SelectQuery) -> Result<Vec<Row<'a>>> {
        let key_rows = self.base.db.select(&query)?;
        let mut out = Vec::with_capacity(key_rows.len());
        for mut key_row in key_rows {
            let Some(id) = key_row.remove(&self.descriptor.primary_key) else {
                continue;
            };
            if let Some(row) = self.get(id)? {
                out.push(row);
            }
        }
        Ok(out)
    }

    fn filter_allowed<K: AsRef<str>>(&self, data: &[(K, Value)]) -> Vec<(String, Value)> {
        let mut kept = Vec::with_capacity(data.len());
        for (key, value) in data {
            let key = key.as_ref();
            if self.descriptor.allowed_fields.iter().any(|f| f == key) {
                kept.push((key.to_string(), value.clone()));
            } else {
                log::debug!(
                    "dropping field '{key}' not writable on '{}'",
                    self.descriptor.table
                );
            }
        }
        kept
    }
}
