//! Domain error types.
//!
//! "No result" outcomes (empty usable series, zero closed trades) are not
//! errors; they surface as `Option::None` from the pipeline.

/// Top-level error type for stratscope.
#[derive(Debug, thiserror::Error)]
pub enum StratscopeError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("upstream fetch failed for {symbol}: {reason}")]
    UpstreamFetch { symbol: String, reason: String },

    #[error("upstream fetch for {symbol} timed out after {seconds}s")]
    UpstreamTimeout { symbol: String, seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratscopeError {
    /// Whether a caller may recover by substituting degraded data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StratscopeError::UpstreamFetch { .. }
                | StratscopeError::UpstreamTimeout { .. }
                | StratscopeError::NoData { .. }
        )
    }
}

impl From<&StratscopeError> for std::process::ExitCode {
    fn from(err: &StratscopeError) -> Self {
        let code: u8 = match err {
            StratscopeError::Io(_) => 1,
            StratscopeError::ConfigParse { .. }
            | StratscopeError::ConfigMissing { .. }
            | StratscopeError::ConfigInvalid { .. } => 2,
            StratscopeError::Database { .. } | StratscopeError::DatabaseQuery { .. } => 3,
            StratscopeError::NoData { .. } | StratscopeError::InsufficientData { .. } => 5,
            StratscopeError::UpstreamFetch { .. } | StratscopeError::UpstreamTimeout { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
