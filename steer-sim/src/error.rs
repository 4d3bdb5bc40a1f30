use thiserror::Error;

#[derive(Error, Debug)]
pub enum SteerError {
    #[error("Invalid path: {reason}")]
    InvalidPath { reason: String },

    #[error("Invalid obstacle: {reason}")]
    InvalidObstacle { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Token for slot {slot} was not issued by proximity index {index_id}")]
    ForeignToken { slot: usize, index_id: u64 },

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

pub type SteerResult<T> = Result<T, SteerError>;
