use thiserror::Error;

/// Main error type for the motion blur library
#[derive(Error, Debug)]
pub enum BlurError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Filter lifecycle errors
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Cannot handle input format: {chroma}")]
    UnsupportedFormat { chroma: String },

    #[error("Output sink creation failed: {reason}")]
    SinkCreationFailed { reason: String },

    #[error("Filter has not been initialized")]
    NotInitialized,

    #[error("Filter has been terminated")]
    Terminated,

    #[error("Operation not allowed in state {state}")]
    InvalidState { state: String },

    #[error("Input frame {found} does not match negotiated geometry {expected}")]
    InputMismatch { expected: String, found: String },
}

/// Frame layout errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Plane count mismatch: expected {expected}, found {found}")]
    PlaneCountMismatch { expected: usize, found: usize },

    #[error("Plane {plane} layout mismatch: expected {expected}, found {found}")]
    PlaneLayoutMismatch {
        plane: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid plane: {details}")]
    InvalidPlane { details: String },

    #[error("Cannot convert {chroma} frames")]
    UnsupportedConversion { chroma: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using BlurError
pub type Result<T> = std::result::Result<T, BlurError>;

impl BlurError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether the pipeline can carry on without this filter instance
    ///
    /// An unsupported input format means the filter declined the stream;
    /// the caller may bypass it.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Filter(FilterError::UnsupportedFormat { .. }) => true,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Filter(FilterError::UnsupportedFormat { chroma }) => {
                format!(
                    "The motion blur filter cannot handle {} input. Supported formats: I420, IYUV, YV12, I422",
                    chroma
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
