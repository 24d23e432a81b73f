use thiserror::Error;

/// Errors surfaced while loading catalogs/config or resolving selection keys.
///
/// Interactive selections come from closed menus, so in practice these only
/// show up when an external JSON override is malformed.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown {table} key: {key:?}")]
    UnknownKey { table: &'static str, key: String },

    #[error("unsupported precision: {0} bits (expected 4, 8 or 16)")]
    InvalidPrecision(u32),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn unknown(table: &'static str, key: &str) -> Self {
        SimError::UnknownKey {
            table,
            key: key.to_string(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
