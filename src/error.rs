use thiserror::Error;

/// Every way a single remote-control run can fail.
///
/// None of these are recovered from locally: the driver hands the error back
/// to `main`, which logs it and exits non-zero.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unrecognized command: {0}")]
    UnknownCommand(String),

    #[error("{command} requires an argument: {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("invalid JSON payload: {0}")]
    InvalidPayload(String),

    /// The device answered with an `error`-typed message (kept verbatim).
    #[error("device returned an error: {0}")]
    Device(String),

    #[error("could not find app with name: {0}")]
    AppNotFound(String),

    #[error("could not parse app list for resolution: {0}")]
    MalformedAppList(String),

    #[error("connection closed before the command completed")]
    ConnectionClosed,

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("SOCKS5 proxy error: {0}")]
    Proxy(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
