use thiserror::Error;

/// Errors from the cache backend.
///
/// These are infrastructure errors: callers on the write path log them and
/// continue, and the stats endpoint degrades to an "unavailable" payload.
/// They must never fail the business operation that triggered them.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backend could not serve the request.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
