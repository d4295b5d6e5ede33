use thiserror::Error;
use tokio_util::codec::LinesCodecError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not bind any address for {0}")]
    Bind(String),

    #[error("cell ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds { x: usize, y: usize, size: usize },

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LinesCodecError> for ServerError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::LineTooLong(shared::MAX_LINE_LENGTH),
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}

impl ServerError {
    /// Process exit code for errors that abort server startup
    pub fn exit_code(&self) -> u8 {
        match self {
            ServerError::Bind(_) => 2,
            _ => 1,
        }
    }
}
