use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure came from the backend rather than from the caller's input.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Io(_) | Self::Internal(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // Map "no rows" to NotFound
            sqlx::Error::RowNotFound => Self::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL unique_violation
                    "23505" => {
                        let constraint = db_err.constraint().unwrap_or_default();
                        if constraint.contains("pairing_code") {
                            Self::AlreadyExists("Pairing code already in use".to_string())
                        } else if constraint.contains("folders") {
                            Self::AlreadyExists(
                                "A folder with that name already exists".to_string(),
                            )
                        } else if constraint.contains("playlists") {
                            Self::AlreadyExists(
                                "A playlist with that name already exists".to_string(),
                            )
                        } else if constraint.contains("device_id") {
                            Self::AlreadyExists("Device already registered".to_string())
                        } else {
                            Self::AlreadyExists("Resource already exists".to_string())
                        }
                    }
                    // PostgreSQL foreign_key_violation
                    "23503" => Self::NotFound("Referenced resource not found".to_string()),
                    // PostgreSQL check_violation
                    "23514" => Self::InvalidInput("Constraint check failed".to_string()),
                    // PostgreSQL not_null_violation
                    "23502" => Self::InvalidInput("Required field is missing".to_string()),
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
