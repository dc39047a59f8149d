use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Empty frame: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("Frame size mismatch: got {width}x{height}, session is {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Stale frame {sequence}: frame {last_applied} already applied")]
    StaleFrame { sequence: u64, last_applied: u64 },

    #[error("Frame source error: {0}")]
    FrameSource(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GuardError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the orchestrator can recover by skipping the current cycle
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyFrame { .. }
                | Self::FrameSizeMismatch { .. }
                | Self::FrameSource(_)
                | Self::ImageLoad(_)
                | Self::StaleFrame { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
