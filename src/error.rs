use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlCommandError {
    /// Errors raised by the database engine, passed through unmodified.
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Command not created: call set_command_text or set_stored_procedure first")]
    CommandNotCreated,

    #[error("Command holds no SQL statement")]
    EmptyCommand,

    #[error("Invalid parameter type: field `{0}` is not a SqlParameter")]
    InvalidParameterType(String),

    #[error("Transaction already active (id {0}); commit or roll back before beginning another")]
    TransactionAlreadyActive(u64),

    #[error("Unknown stored procedure: {0}")]
    UnknownProcedure(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SqlCommandError {
    pub(crate) fn conversion(value: &crate::types::RowValues, target: &str) -> Self {
        SqlCommandError::ConversionError(format!("cannot convert {value:?} to {target}"))
    }
}
