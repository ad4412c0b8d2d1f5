use thiserror::Error;

/// Main error type for the effect-assets library
#[derive(Error, Debug)]
pub enum EffectsError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Keyframe error: {0}")]
    Keyframe(#[from] KeyframeError),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Asset registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Asset not found: {id}")]
    NotFound { id: String },

    #[error("Definition file rejected: {path} - {reason}")]
    DefinitionRejected { path: String, reason: String },
}

/// Keyframe model errors
#[derive(Error, Debug)]
pub enum KeyframeError {
    #[error("No keyframe at position {position}")]
    NotFound { position: i64 },

    #[error("Unknown parameter index: {index}")]
    UnknownParameter { index: usize },

    #[error("Parameter is not keyframable: {name}")]
    NotKeyframable { name: String },

    #[error("Value type mismatch for {name}: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Malformed keyframe data '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

/// XML definition document errors
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML: {reason}")]
    Malformed { reason: String },

    #[error("Document has no root element")]
    NoRoot,

    #[error("Document declares no asset elements")]
    NoAssets,

    #[error("Failed to write XML: {reason}")]
    WriteFailed { reason: String },
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

/// Convenience type alias for Results using EffectsError
pub type Result<T> = std::result::Result<T, EffectsError>;

impl EffectsError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error is a lookup miss the caller may recover from
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Registry(RegistryError::NotFound { .. })
                | Self::Keyframe(KeyframeError::NotFound { .. })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Registry(RegistryError::NotFound { id }) => {
                format!("Effect '{}' is not installed. Run `effect-assets list` to see available effects.", id)
            }
            Self::Keyframe(KeyframeError::NotFound { position }) => {
                format!("There is no keyframe at frame {} to delete.", position)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
