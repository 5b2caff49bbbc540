use std::collections::HashMap;
use std::path::Path;

use crate::db::Database;
use crate::entity::{Entity, EntityDescriptor};
use crate::error::{EmberError, Result};
use crate::naming::{DefaultInflector, Inflector};
use crate::schema::{parse_schema, EntityDeclaration, SchemaDefinition};

/// Owns the connection and every registered entity descriptor, and hands
/// out borrowed `Entity` handles for the actual work.
pub struct Base {
    pub(crate) db: Database,
    entities: HashMap<String, EntityDescriptor>,
    inflector: Box<dyn Inflector>,
}

impl Base {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Base {
            db: Database::open(path)?,
            entities: HashMap::new(),
            inflector: Box::new(DefaultInflector),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Base {
            db: Database::open_in_memory()?,
            entities: HashMap::new(),
            inflector: Box::new(DefaultInflector),
        })
    }

    /// Open a database and register every entity a YAML schema declares.
    /// The backing tables must already exist.
    pub fn open_with_schema(db_path: &Path, schema_path: &Path) -> Result<Self> {
        let mut base = Base::open(db_path)?;
        let schema = parse_schema(schema_path)?;
        base.register_schema(&schema)?;
        Ok(base)
    }

    /// Replace the naming strategy. Call before registering entities so
    /// singular names and join tables are derived consistently.
    pub fn with_inflector(mut self, inflector: Box<dyn Inflector>) -> Self {
        self.inflector = inflector;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn inflector(&self) -> &dyn Inflector {
        self.inflector.as_ref()
    }

    /// Register `table` as an entity, configuring its declaration in
    /// place. Columns are introspected from the live database.
    pub fn register(
        &mut self,
        table: &str,
        configure: impl FnOnce(&mut EntityDeclaration),
    ) -> Result<()> {
        let mut declaration = EntityDeclaration::default();
        configure(&mut declaration);
        self.register_declaration(table, &declaration)
    }

    pub fn register_declaration(
        &mut self,
        table: &str,
        declaration: &EntityDeclaration,
    ) -> Result<()> {
        if self.entities.contains_key(table) {
            return Err(EmberError::Schema(format!(
                "entity '{table}' is already registered"
            )));
        }
        let field_names = self.db.table_columns(table)?;
        if !field_names.iter().any(|f| f == &declaration.primary_key) {
            return Err(EmberError::Schema(format!(
                "primary key '{}' is not a column of '{table}'",
                declaration.primary_key
            )));
        }

        let relationships = crate::relation::Relationships {
            belongs_to: declaration.belongs_to.clone(),
            has_many: declaration.has_many.clone(),
            has_and_belongs_to_many: declaration.has_and_belongs_to_many.clone(),
        };
        relationships.validate(table)?;

        let allowed_fields: Vec<String> = field_names
            .iter()
            .filter(|f| *f != &declaration.primary_key)
            .cloned()
            .collect();
        let finders = field_names.iter().cloned().collect();

        let descriptor = EntityDescriptor {
            table: table.to_string(),
            primary_key: declaration.primary_key.clone(),
            field_names,
            allowed_fields,
            singular_name: self.inflector.singularize(table),
            relationships,
            finders,
        };
        self.entities.insert(table.to_string(), descriptor);
        Ok(())
    }

    /// Register every entity in a parsed schema document. Tables are
    /// processed in name order so failures are deterministic.
    pub fn register_schema(&mut self, schema: &SchemaDefinition) -> Result<()> {
        let mut tables: Vec<&String> = schema.entities.keys().collect();
        tables.sort();
        for table in tables {
            self.register_declaration(table, &schema.entities[table])?;
        }
        Ok(())
    }

    /// Handle on a registered entity.
    pub fn entity(&self, table: &str) -> Result<Entity<'_>> {
        let descriptor = self.entities.get(table).ok_or_else(|| {
            EmberError::Schema(format!("entity '{table}' is not registered"))
        })?;
        Ok(Entity {
            base: self,
            descriptor,
        })
    }

    /// Look up an entity by relationship name: exact table match first,
    /// then the pluralized form.
    pub(crate) fn find_entity(&self, name: &str) -> Option<&EntityDescriptor> {
        if let Some(descriptor) = self.entities.get(name) {
            return Some(descriptor);
        }
        self.entities.get(&self.inflector.pluralize(name))
    }
}
