use std::fmt;

#[derive(Debug, Clone)]
pub enum SnaplinkError {
    NotFound(String),
    Expired(String),
    FastStoreUnavailable(String),
    Allocation(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    Serialization(String),
    DateParse(String),
    Configuration(String),
}

impl SnaplinkError {
    /// Stable error code, used in logs and upstream responses
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::NotFound(_) => "E001",
            SnaplinkError::Expired(_) => "E002",
            SnaplinkError::FastStoreUnavailable(_) => "E003",
            SnaplinkError::Allocation(_) => "E004",
            SnaplinkError::DatabaseConnection(_) => "E005",
            SnaplinkError::DatabaseOperation(_) => "E006",
            SnaplinkError::Validation(_) => "E007",
            SnaplinkError::Serialization(_) => "E008",
            SnaplinkError::DateParse(_) => "E009",
            SnaplinkError::Configuration(_) => "E010",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::NotFound(_) => "Short Code Not Found",
            SnaplinkError::Expired(_) => "Short Code Expired",
            SnaplinkError::FastStoreUnavailable(_) => "Fast Store Unavailable",
            SnaplinkError::Allocation(_) => "Sequence Allocation Error",
            SnaplinkError::DatabaseConnection(_) => "Database Connection Error",
            SnaplinkError::DatabaseOperation(_) => "Database Operation Error",
            SnaplinkError::Validation(_) => "Validation Error",
            SnaplinkError::Serialization(_) => "Serialization Error",
            SnaplinkError::DateParse(_) => "Date Parse Error",
            SnaplinkError::Configuration(_) => "Configuration Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SnaplinkError::NotFound(msg)
            | SnaplinkError::Expired(msg)
            | SnaplinkError::FastStoreUnavailable(msg)
            | SnaplinkError::Allocation(msg)
            | SnaplinkError::DatabaseConnection(msg)
            | SnaplinkError::DatabaseOperation(msg)
            | SnaplinkError::Validation(msg)
            | SnaplinkError::Serialization(msg)
            | SnaplinkError::DateParse(msg)
            | SnaplinkError::Configuration(msg) => msg,
        }
    }

    /// Transient failures are eligible for the durable-store fallback paths;
    /// everything else propagates to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, SnaplinkError::FastStoreUnavailable(_))
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code(), self.error_type(), self.message())
    }
}

impl std::error::Error for SnaplinkError {}

// Convenience constructors
impl SnaplinkError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Expired(msg.into())
    }

    pub fn fast_store_unavailable<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::FastStoreUnavailable(msg.into())
    }

    pub fn allocation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Allocation(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DateParse(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Configuration(msg.into())
    }
}

impl From<sea_orm::DbErr> for SnaplinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        SnaplinkError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for SnaplinkError {
    fn from(err: redis::RedisError) -> Self {
        SnaplinkError::FastStoreUnavailable(err.to_string())
    }
}

impl From<chrono::ParseError> for SnaplinkError {
    fn from(err: chrono::ParseError) -> Self {
        SnaplinkError::DateParse(err.to_string())
    }
}

impl From<serde_json::Error> for SnaplinkError {
    fn from(err: serde_json::Error) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

impl From<std::num::ParseIntError> for SnaplinkError {
    fn from(err: std::num::ParseIntError) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;
