/// Result alias that carries the custom [`ConcertError`] type.
pub type Result<T> = std::result::Result<T, ConcertError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ConcertError {
    /// Free-form failure used where no more specific variant applies.
    #[error("{0}")]
    Message(String),
    /// The event source or geocoder could not be reached, answered with a
    /// non-success status, or returned a body that could not be decoded.
    #[error("transport error: {0}")]
    Transport(String),
    /// The event datetime did not carry a `YYYY-MM-DDT...` date prefix.
    #[error("malformed event date `{0}`")]
    MalformedDate(String),
    /// Latitude or longitude outside the valid WGS84 range.
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    /// The configured home location could not be geocoded.
    #[error("origin location `{0}` could not be resolved")]
    OriginNotFound(String),
    /// Configuration file could not be parsed or holds out-of-range values.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Report template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    /// Batch glob pattern is not valid syntax.
    #[error("invalid batch pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ConcertError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` for failures that only affect a single band or record
    /// and should be logged and skipped rather than propagated.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::MalformedDate(_))
    }
}

impl From<reqwest::Error> for ConcertError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<toml::de::Error> for ConcertError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<&str> for ConcertError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ConcertError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
