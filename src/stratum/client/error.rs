use super::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientError {
    #[snafu(display("connection timed out: {source}"))]
    ConnectTimeout { source: tokio::time::error::Elapsed },

    #[snafu(display("connection closed by server"))]
    ConnectionClosed,

    #[snafu(display("no response to {method} within the deadline"))]
    RequestTimeout { method: &'static str },

    #[snafu(display("authorization failed: {reason}"))]
    Unauthorized { reason: String },

    #[snafu(display("protocol error: {message}"))]
    Protocol { message: String },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("serialization error: {source}"))]
    Serialization { source: serde_json::Error },
}

/// Why the background reader stopped. Recorded before the notification
/// stream closes so pending and future calls can fail with the root cause.
#[derive(Debug, Clone)]
pub enum DisconnectReason {
    ServerClosed,
    Protocol(String),
    Read(String),
    Stopped,
}

impl DisconnectReason {
    pub(crate) fn into_error(self) -> ClientError {
        match self {
            Self::ServerClosed | Self::Stopped => ClientError::ConnectionClosed,
            Self::Protocol(message) => ClientError::Protocol { message },
            Self::Read(message) => ClientError::Io {
                source: std::io::Error::other(message),
            },
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerClosed => write!(f, "server closed connection"),
            Self::Protocol(message) => write!(f, "protocol error: {message}"),
            Self::Read(message) => write!(f, "read error: {message}"),
            Self::Stopped => write!(f, "client stopped"),
        }
    }
}
