pub mod base;
pub mod db;
pub mod entity;
pub mod error;
pub mod naming;
pub mod query;
pub mod record;
pub mod relation;
pub mod schema;
pub mod value;

pub use base::Base;
pub use db::Database;
pub use entity::{Criterion, Entity, EntityDescriptor, InputSource};
pub use error::{EmberError, Result};
pub use query::SelectQuery;
pub use record::{record_to_json, Field, Record, Row};
pub use relation::{RelationKind, Relationships};
pub use schema::{parse_schema, parse_schema_str, EntityDeclaration, SchemaDefinition};
pub use value::Value;
