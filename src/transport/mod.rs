// WebSocket transport to the TV, optionally tunneled through a SOCKS5 proxy

pub mod socks;

use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::info;

use crate::error::SessionError;
use crate::ssap::OutboundMessage;

/// Open connection to the TV
pub type Connection = WebSocketStream<TcpStream>;

/// WebSocket URL for a TV at `addr` (host:port)
pub fn endpoint_url(addr: &str) -> String {
    format!("ws://{addr}/")
}

/// Dial the TV and complete the WebSocket upgrade.
pub async fn connect(addr: &str, socks5_proxy: Option<&str>) -> Result<Connection, SessionError> {
    let url = endpoint_url(addr);
    info!("Connecting to {}", url);

    let tcp = match socks5_proxy {
        Some(proxy) => {
            info!("Using SOCKS5 proxy: {}", proxy);
            socks::connect(proxy, addr).await?
        }
        None => TcpStream::connect(addr)
            .await
            .map_err(|source| SessionError::Connect {
                target: addr.to_string(),
                source,
            })?,
    };

    let (connection, _response) = tokio_tungstenite::client_async(url.as_str(), tcp).await?;
    Ok(connection)
}

/// Encode a message as a JSON text frame.
pub fn encode(message: &OutboundMessage) -> Result<Message, SessionError> {
    let json = serde_json::to_string(message)?;
    Ok(Message::text(json))
}

/// Normal-closure close frame sent on user interrupt
pub fn close_frame() -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    }))
}
