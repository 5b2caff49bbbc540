use std::collections::{BTreeMap, HashMap, HashSet};

use crate::base::Base;
use crate::entity::EntityDescriptor;
use crate::error::{EmberError, Result};
use crate::query::SelectQuery;
use crate::record::{Field, Record};
use crate::value::Value;

/// The three declared relationship shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    HasAndBelongsToMany,
}

impl RelationKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasMany => "has_many",
            RelationKind::HasAndBelongsToMany => "has_and_belongs_to_many",
        }
    }
}

/// Relationship names declared for one entity, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    pub belongs_to: Vec<String>,
    pub has_many: Vec<String>,
    pub has_and_belongs_to_many: Vec<String>,
}

impl Relationships {
    /// Reject a related name declared under more than one kind. Such a
    /// declaration would make the attachment key ambiguous.
    pub fn validate(&self, table: &str) -> Result<()> {
        let mut seen: HashMap<&str, RelationKind> = HashMap::new();
        let groups = [
            (RelationKind::BelongsTo, &self.belongs_to),
            (RelationKind::HasMany, &self.has_many),
            (RelationKind::HasAndBelongsToMany, &self.has_and_belongs_to_many),
        ];
        for (kind, names) in groups {
            for name in names {
                if let Some(prior) = seen.insert(name.as_str(), kind) {
                    if prior != kind {
                        return Err(EmberError::RelationshipConfig(format!(
                            "'{name}' on '{table}' is declared as both {} and {}",
                            prior.label(),
                            kind.label()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tracks records already being resolved so mutual belongs-to
/// declarations terminate instead of recursing forever.
pub(crate) struct ResolveCtx {
    visited: HashSet<(String, String)>,
}

impl ResolveCtx {
    pub(crate) fn new() -> Self {
        ResolveCtx {
            visited: HashSet::new(),
        }
    }

    fn mark(&mut self, table: &str, id: &Value) {
        self.visited.insert((table.to_string(), format!("{id:?}")));
    }

    fn seen(&self, table: &str, id: &Value) -> bool {
        self.visited.contains(&(table.to_string(), format!("{id:?}")))
    }
}

fn scalars_to_record(columns: BTreeMap<String, Value>) -> Record {
    columns
        .into_iter()
        .map(|(k, v)| (k, Field::Scalar(v)))
        .collect()
}

fn sibling<'a>(base: &'a Base, table: &str, name: &str) -> Result<&'a EntityDescriptor> {
    base.find_entity(name).ok_or_else(|| {
        EmberError::RelationshipConfig(format!(
            "'{table}' declares relationship '{name}' but no matching entity is registered"
        ))
    })
}

/// Fetch one record by key and attach every declared relationship.
///
/// Resolution order is belongs-to, then has-many, then the join-table
/// collections. A failed relationship query aborts the whole fetch.
pub(crate) fn fetch_resolved(
    base: &Base,
    descriptor: &EntityDescriptor,
    id: &Value,
    ctx: &mut ResolveCtx,
) -> Result<Option<Record>> {
    let query = SelectQuery::new(&descriptor.table)
        .filter_eq(&descriptor.primary_key, id.clone());
    let mut rows = base.db.select(&query)?;
    let Some(columns) = rows.pop() else {
        return Ok(None);
    };
    ctx.mark(&descriptor.table, id);
    let mut record = scalars_to_record(columns);

    resolve_belongs_to(base, descriptor, &mut record, ctx)?;
    resolve_has_many(base, descriptor, id, &mut record)?;
    resolve_habtm(base, descriptor, id, &mut record)?;

    Ok(Some(record))
}

fn resolve_belongs_to(
    base: &Base,
    descriptor: &EntityDescriptor,
    record: &mut Record,
    ctx: &mut ResolveCtx,
) -> Result<()> {
    for name in &descriptor.relationships.belongs_to {
        let fk = format!("{}_id", base.inflector().singularize(name));
        let fk_value = match record.get(&fk).and_then(Field::as_scalar) {
            Some(v) if !v.is_null() => v.clone(),
            _ => continue,
        };
        let related = sibling(base, &descriptor.table, name)?;
        if ctx.seen(&related.table, &fk_value) {
            log::debug!(
                "skipping '{name}' on '{}': record already on the resolution path",
                descriptor.table
            );
            continue;
        }
        if let Some(parent) = fetch_resolved(base, related, &fk_value, ctx)? {
            record.insert(name.clone(), Field::One(parent));
        }
    }
    Ok(())
}

fn resolve_has_many(
    base: &Base,
    descriptor: &EntityDescriptor,
    id: &Value,
    record: &mut Record,
) -> Result<()> {
    for name in &descriptor.relationships.has_many {
        let related = sibling(base, &descriptor.table, name)?;
        let fk = format!("{}_id", descriptor.singular_name);
        let rows = base
            .db
            .select(&SelectQuery::new(&related.table).filter_eq(&fk, id.clone()))?;
        let children: Vec<Record> = rows.into_iter().map(scalars_to_record).collect();
        record.insert(name.clone(), Field::Many(children));
    }
    Ok(())
}

fn resolve_habtm(
    base: &Base,
    descriptor: &EntityDescriptor,
    id: &Value,
    record: &mut Record,
) -> Result<()> {
    for name in &descriptor.relationships.has_and_belongs_to_many {
        let related = sibling(base, &descriptor.table, name)?;
        let pivot = format!("{}_{}", descriptor.table, name);
        let local_fk = format!("{}_id", descriptor.singular_name);
        let related_fk = format!("{}_id", base.inflector().singularize(name));

        let pivot_rows = base.db.select(
            &SelectQuery::new(&pivot)
                .columns(&[related_fk.as_str()])
                .filter_eq(&local_fk, id.clone()),
        )?;
        let related_ids: Vec<Value> = pivot_rows
            .into_iter()
            .filter_map(|mut row| row.remove(&related_fk))
            .collect();

        if related_ids.is_empty() {
            record.insert(name.clone(), Field::Many(Vec::new()));
            continue;
        }
        let rows = base.db.select(
            &SelectQuery::new(&related.table).filter_in(&related.primary_key, related_ids),
        )?;
        let attached: Vec<Record> = rows.into_iter().map(scalars_to_record).collect();
        record.insert(name.clone(), Field::Many(attached));
    }
    Ok(())
}
