//! Error types for scopebank commands.
//!
//! Every command funnels into [`AppError`], which carries a stable exit code
//! so scripts can distinguish failure classes. Validation rejections of
//! individual input lines are *not* errors — they are counted and summarized
//! by the add command. `AppError::InvalidDomain` only surfaces when an entire
//! import produced nothing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// An import ran to completion but every line was rejected by the
    /// validator, so nothing was stored.
    #[error("no valid domains in input ({invalid} line(s) rejected)")]
    InvalidDomain { invalid: u64 },

    /// The database is unreachable or rejected our credentials.
    #[error("cannot reach PostgreSQL: {message}\n  check host/port/credentials in your config file or PG* environment variables")]
    Connection { message: String },

    /// A unique-constraint violation leaked through the dedup path. Bulk
    /// inserts use ON CONFLICT DO NOTHING, so this indicates a bug in the
    /// store adapter rather than bad user input.
    #[error("unexpected constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Malformed `--regex` pattern. Raised before any store access.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Destructive operation attempted without confirmation.
    #[error("operation aborted: confirmation required (pass --confirm to skip the prompt)")]
    ConfirmationRequired,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit code for this error. Stable within a release.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Database(_) | AppError::Config(_) | AppError::Io(_) => 1,
            AppError::InvalidPattern(_) => 2,
            AppError::Connection { .. } => 3,
            AppError::ConfirmationRequired => 4,
            AppError::FileNotFound { .. } => 5,
            AppError::InvalidDomain { .. } => 6,
            AppError::ConstraintViolation { .. } => 1,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => AppError::Connection {
                message: e.to_string(),
            },
            sqlx::Error::Database(db) => {
                // SQLSTATE class 28 = invalid authorization, class 23 =
                // integrity constraint violation.
                let code = db.code().unwrap_or_default().into_owned();
                if code.starts_with("28") {
                    AppError::Connection {
                        message: db.message().to_string(),
                    }
                } else if db.is_unique_violation() || code.starts_with("23") {
                    AppError::ConstraintViolation {
                        message: db.message().to_string(),
                    }
                } else {
                    AppError::Database(e)
                }
            }
            _ => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_failure_class() {
        let connection = AppError::Connection {
            message: "refused".into(),
        };
        let pattern = AppError::InvalidPattern(regex::Regex::new("[").unwrap_err());
        let confirm = AppError::ConfirmationRequired;
        let missing = AppError::FileNotFound {
            path: PathBuf::from("/no/such/file"),
        };
        let nothing = AppError::InvalidDomain { invalid: 3 };

        let codes = [
            connection.exit_code(),
            pattern.exit_code(),
            confirm.exit_code(),
            missing.exit_code(),
            nothing.exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn pool_timeout_maps_to_connection() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Connection { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
