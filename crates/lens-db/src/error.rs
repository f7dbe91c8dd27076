use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("{table} references a row that does not exist")]
    MissingReference { table: &'static str },

    #[error("No {table} row with id {id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Diagram error: {0}")]
    Diagram(String),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

impl DbError {
    /// Classify a failed INSERT/UPDATE against `table` by its extended result code.
    pub(crate) fn from_write(err: rusqlite::Error, table: &'static str) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return DbError::MissingReference { table };
                }
                ffi::SQLITE_CONSTRAINT_UNIQUE
                | ffi::SQLITE_CONSTRAINT_CHECK
                | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    let detail = msg.clone().unwrap_or_else(|| code.to_string());
                    return DbError::Constraint(detail);
                }
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
