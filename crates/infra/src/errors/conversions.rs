//! Conversions from external infrastructure errors into domain errors.

use pardot_domain::PardotError;
use redis::RedisError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PardotError);

impl From<InfraError> for PardotError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PardotError> for InfraError {
    fn from(value: PardotError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPardotError {
    fn into_pardot(self) -> PardotError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PardotError */
/* -------------------------------------------------------------------------- */

impl IntoPardotError for SqlError {
    fn into_pardot(self) -> PardotError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => PardotError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        PardotError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => {
                        PardotError::Database(format!("constraint violation: {message}"))
                    }
                    ErrorCode::CannotOpen => {
                        PardotError::Database(format!("unable to open quota database: {message}"))
                    }
                    _ => PardotError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => PardotError::Database("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                PardotError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                PardotError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => PardotError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => PardotError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_pardot())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → PardotError */
/* -------------------------------------------------------------------------- */

impl IntoPardotError for r2d2::Error {
    fn into_pardot(self) -> PardotError {
        PardotError::Database(format!("quota store connection unavailable: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_pardot())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PardotError */
/* -------------------------------------------------------------------------- */

// Responses are never turned into errors here; every status reaches the
// classifier. Only failures to build, send or read a request end up below.
impl IntoPardotError for HttpError {
    fn into_pardot(self) -> PardotError {
        if self.is_timeout() {
            return PardotError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return PardotError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return PardotError::Config(format!("invalid HTTP request: {self}"));
        }

        PardotError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_pardot())
    }
}

/* -------------------------------------------------------------------------- */
/* redis::RedisError → PardotError */
/* -------------------------------------------------------------------------- */

impl IntoPardotError for RedisError {
    fn into_pardot(self) -> PardotError {
        use redis::ErrorKind;

        if self.is_connection_refusal() {
            return PardotError::Database(format!("redis quota store unreachable: {self}"));
        }

        if self.is_timeout() || self.is_connection_dropped() {
            return PardotError::Database(format!("redis connection lost: {self}"));
        }

        match self.kind() {
            ErrorKind::AuthenticationFailed => {
                PardotError::Database(format!("redis authentication failed: {self}"))
            }
            ErrorKind::TypeError => {
                PardotError::Database(format!("unexpected value in quota counter: {self}"))
            }
            ErrorKind::InvalidClientConfig => {
                PardotError::Config(format!("invalid redis connection settings: {self}"))
            }
            _ => PardotError::Database(format!("redis failure: {self}")),
        }
    }
}

impl From<RedisError> for InfraError {
    fn from(value: RedisError) -> Self {
        InfraError(value.into_pardot())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
