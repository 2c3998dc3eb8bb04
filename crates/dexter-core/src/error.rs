use thiserror::Error;

/// Application-wide error types.
///
/// Every fallible operation in Dexter returns this enum. Conversions from
/// the underlying library errors are automatic where a `#[from]` is present:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// HTTP failures are mapped by the client into the network class
/// (`ClientError`, `NetworkError`, `Timeout`, `RateLimitExceeded`, `InvalidUrl`),
/// see [`AppError::is_network_error`].
///
/// # Examples
///
/// ```no_run
/// use dexter_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps all errors from SQLx, including connection failures, query errors,
    /// and constraint violations raised while committing a page.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// HTTP request failed with a non-success status or an unreadable body.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    ///
    /// Raised when the listing start URL or a cursor handed back by the
    /// upstream cannot be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network or connection error.
    ///
    /// DNS failures, refused connections, resets.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Illegal controller transition, e.g. reset while an ingestion run is active.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration value is missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("unable to open database") {
                    "Cannot open the SQLite database.\n   Check DATABASE_URL.".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("HTTP 404") {
                    format!("Resource not found upstream: {}\n   Check the start URL.", msg)
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::InvalidUrl(url) => {
                format!("Invalid URL: {}\n   Example: https://pokeapi.co/api/v2/pokemon", url)
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!("Request timed out after {} seconds.\n   Try again later.", secs)
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Lower --concurrency or try again later.".to_string()
            }
            AppError::InvalidState(msg) => {
                format!("{}\n   Stop the running ingestion first.", msg)
            }
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check your flags and .env file.", msg)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if the error belongs to the network class.
    ///
    /// Network-class errors on a detail fetch are isolated to that item;
    /// on a listing fetch they end the run.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            AppError::ClientError(_)
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::InvalidUrl(_)
                | AppError::SerializationError(_)
        )
    }

    /// Returns true if this error is retryable.
    ///
    /// Dexter never retries internally; callers use this to decide whether
    /// issuing `start` again is worthwhile.
    ///
    /// # Examples
    ///
    /// ```
    /// use dexter_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::InvalidState("running".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }
}
