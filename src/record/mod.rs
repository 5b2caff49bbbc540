use std::collections::BTreeMap;

use crate::base::Base;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::Result;
use crate::value::Value;

/// One resolved field of a record: a plain column value, an attached
/// parent record, or an attached collection of child records.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Scalar(Value),
    One(Record),
    Many(Vec<Record>),
}

impl Field {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Field::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Field::One(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Record]> {
        match self {
            Field::Many(rs) => Some(rs),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Field::Scalar(v) => v.to_json(),
            Field::One(r) => record_to_json(r),
            Field::Many(rs) => serde_json::Value::Array(rs.iter().map(record_to_json).collect()),
        }
    }
}

/// A fully resolved record: column values plus relationship attachments,
/// keyed by field or relationship name.
pub type Record = BTreeMap<String, Field>;

pub fn record_to_json(record: &Record) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = record
        .iter()
        .map(|(k, f)| (k.clone(), f.to_json()))
        .collect();
    serde_json::Value::Object(map)
}

/// A record bound to the entity it came from.
///
/// Reads are `Option` based and never panic on absent fields; persistence
/// calls delegate to the owning entity using the record's own key.
pub struct Row<'a> {
    pub(crate) base: &'a Base,
    pub(crate) descriptor: &'a EntityDescriptor,
    pub(crate) record: Record,
}

impl<'a> Row<'a> {
    pub fn get(&self, field: &str) -> Option<&Field> {
        self.record.get(field)
    }

    pub fn scalar(&self, field: &str) -> Option<&Value> {
        self.record.get(field).and_then(Field::as_scalar)
    }

    pub fn one(&self, field: &str) -> Option<&Record> {
        self.record.get(field).and_then(Field::as_one)
    }

    pub fn many(&self, field: &str) -> Option<&[Record]> {
        self.record.get(field).and_then(Field::as_many)
    }

    /// Primary key value, or `Null` when the record somehow lacks it.
    pub fn id(&self) -> Value {
        self.scalar(&self.descriptor.primary_key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Handle on the entity this row belongs to.
    pub fn entity(&self) -> Entity<'a> {
        Entity {
            base: self.base,
            descriptor: self.descriptor,
        }
    }

    /// Update this row in place through its owning entity.
    pub fn update<K: AsRef<str>>(&self, data: &[(K, Value)]) -> Result<bool> {
        self.entity().update(self.id(), data)
    }

    /// Delete this row through its owning entity.
    pub fn delete(&self) -> Result<bool> {
        self.entity().delete(self.id())
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn to_json(&self) -> serde_json::Value {
        record_to_json(&self.record)
    }
}
