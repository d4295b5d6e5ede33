use shared::ProtocolError;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {0}")]
    Connect(String),

    #[error("server closed the connection")]
    ConnectionClosed,

    #[error("expected {expected}, got '{got}'")]
    UnexpectedReply { expected: &'static str, got: String },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LinesCodecError> for ClientError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::LineTooLong(shared::MAX_LINE_LENGTH),
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}

impl ClientError {
    /// Process exit code: 2 when no resolved address accepted the connection
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Connect(_) => 2,
            _ => 1,
        }
    }
}
