use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmberError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Relationship config error: {0}")]
    RelationshipConfig(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmberError>;
