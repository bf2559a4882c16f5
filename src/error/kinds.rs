use std::{fmt, io};

/// Crate-wide `Result` type using [`AtlasError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Top-level error type for atlas-export operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum AtlasError {
    /// Export pipeline and serializer errors.
    Export(ExportError),

    /// Search endpoint errors.
    Api(ApiError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// HTTP transport errors.
    Http(reqwest::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Export-specific errors.
#[derive(Debug)]
pub enum ExportError {
    /// The search matched more primary entities than an export may hold.
    LimitExceeded { count: u64, max: u64 },

    /// A single page request failed.
    PageFetch { page: u32, message: String },

    /// Building or saving one output format failed.
    Serialization { format: String, message: String },

    /// The export was cancelled before it started producing records.
    Cancelled,
}

/// Search endpoint errors.
#[derive(Debug)]
pub enum ApiError {
    /// Non-success HTTP status.
    Status { status: u16, body: String },

    /// The backend refused the request (HTTP 403).
    PermissionDenied(String),

    /// The session is no longer valid (HTTP 401).
    SessionExpired,

    /// Response body could not be decoded.
    Decode(String),

    /// The configured base URL is not usable.
    InvalidUrl(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Export(e) => write!(f, "{e}"),
            AtlasError::Api(e) => write!(f, "API error: {e}"),
            AtlasError::Config(e) => write!(f, "Configuration error: {e}"),
            AtlasError::Io(e) => write!(f, "I/O error: {e}"),
            AtlasError::Http(e) => write!(f, "HTTP error: {e}"),
            AtlasError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::LimitExceeded { count, max } => write!(
                f,
                "Export limit exceeded: {count} titulares found, maximum allowed is {max}. \
                 Narrow the filters and try again."
            ),
            ExportError::PageFetch { page, message } => {
                write!(f, "Failed to fetch page {page}: {message}")
            }
            ExportError::Serialization { format, message } => {
                write!(f, "Failed to export {format}: {message}")
            }
            ExportError::Cancelled => write!(f, "Export cancelled"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status { status, body } if body.is_empty() => {
                write!(f, "Request failed with status {status}")
            }
            ApiError::Status { status, body } => {
                write!(f, "Request failed with status {status}: {body}")
            }
            ApiError::PermissionDenied(msg) => write!(f, "Permission denied: {msg}"),
            ApiError::SessionExpired => write!(f, "Session expired"),
            ApiError::Decode(msg) => write!(f, "Invalid response body: {msg}"),
            ApiError::InvalidUrl(url) => write!(f, "Invalid base URL: {url}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for AtlasError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ApiError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to AtlasError ========================= */

impl From<io::Error> for AtlasError {
    fn from(err: io::Error) -> Self {
        AtlasError::Io(err)
    }
}

impl From<reqwest::Error> for AtlasError {
    fn from(err: reqwest::Error) -> Self {
        AtlasError::Http(err)
    }
}

impl From<ExportError> for AtlasError {
    fn from(err: ExportError) -> Self {
        AtlasError::Export(err)
    }
}

impl From<ApiError> for AtlasError {
    fn from(err: ApiError) -> Self {
        AtlasError::Api(err)
    }
}

impl From<ConfigError> for AtlasError {
    fn from(err: ConfigError) -> Self {
        AtlasError::Config(err)
    }
}

impl From<String> for AtlasError {
    fn from(msg: String) -> Self {
        AtlasError::Generic(msg)
    }
}

impl From<&str> for AtlasError {
    fn from(msg: &str) -> Self {
        AtlasError::Generic(msg.to_owned())
    }
}

impl AtlasError {
    /// Wrap any displayable failure as a serialization error for `format`.
    pub fn serialization(format: impl Into<String>, err: impl fmt::Display) -> Self {
        AtlasError::Export(ExportError::Serialization {
            format: format.into(),
            message: err.to_string(),
        })
    }

    /// Returns true when the error is a record-limit violation.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, AtlasError::Export(ExportError::LimitExceeded { .. }))
    }
}
