use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("required source table '{0}' is missing from the workbook")]
    MissingSource(String),

    #[error("table '{table}' is missing required columns: {columns}")]
    MissingColumns { table: String, columns: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
