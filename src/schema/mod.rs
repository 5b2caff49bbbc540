use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

fn default_primary_key() -> String {
    "id".to_string()
}

/// Declarative entity description, loadable from YAML or built in code.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDeclaration {
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub belongs_to: Vec<String>,
    #[serde(default)]
    pub has_many: Vec<String>,
    #[serde(default)]
    pub has_and_belongs_to_many: Vec<String>,
}

impl Default for EntityDeclaration {
    fn default() -> Self {
        EntityDeclaration {
            primary_key: default_primary_key(),
            belongs_to: Vec::new(),
            has_many: Vec::new(),
            has_and_belongs_to_many: Vec::new(),
        }
    }
}

impl EntityDeclaration {
    pub fn primary_key(&mut self, key: &str) -> &mut Self {
        self.primary_key = key.to_string();
        self
    }

    pub fn belongs_to(&mut self, name: &str) -> &mut Self {
        self.belongs_to.push(name.to_string());
        self
    }

    pub fn has_many(&mut self, name: &str) -> &mut Self {
        self.has_many.push(name.to_string());
        self
    }

    pub fn has_and_belongs_to_many(&mut self, name: &str) -> &mut Self {
        self.has_and_belongs_to_many.push(name.to_string());
        self
    }
}

/// Top-level schema document: entity declarations keyed by table name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub entities: HashMap<String, EntityDeclaration>,
}

pub fn parse_schema(path: &Path) -> Result<SchemaDefinition> {
    let text = std::fs::read_to_string(path)?;
    parse_schema_str(&text)
}

pub fn parse_schema_str(text: &str) -> Result<SchemaDefinition> {
    let schema: SchemaDefinition = serde_yaml::from_str(text)?;
    Ok(schema)
}
