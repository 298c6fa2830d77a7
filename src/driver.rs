use std::future::Future;
use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::credential::CredentialStore;
use crate::error::SessionError;
use crate::ssap::{Effect, Invocation, OutboundMessage, Outcome, Session};
use crate::transport::{self, Connection};

/// Connection settings for one run
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub addr: String,
    pub socks5_proxy: Option<String>,
    /// How long to wait for the TV to acknowledge a close after an interrupt
    pub close_timeout: Duration,
}

impl From<&Config> for DriverConfig {
    fn from(config: &Config) -> Self {
        Self {
            addr: config.addr().to_string(),
            socks5_proxy: config.socks5_proxy().map(str::to_string),
            close_timeout: config.close_timeout(),
        }
    }
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    Completed(Outcome),
    /// The user interrupted before the command finished
    Interrupted,
}

/// Run one command against the TV.
///
/// A reader task feeds inbound frames through the [`Session`] and a writer
/// task owns the socket's sink; the calling task sends the handshake and then
/// waits for either the reader's outcome or `shutdown`. On shutdown a close
/// frame is queued and the reader gets at most `close_timeout` to finish.
pub async fn run<S, F>(
    config: &DriverConfig,
    invocation: Invocation,
    store: S,
    shutdown: F,
) -> Result<RunResult, SessionError>
where
    S: CredentialStore + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    let stored_key = match store.load() {
        Ok(key) => key,
        Err(e) => {
            warn!("Could not read client key, pairing from scratch: {}", e);
            None
        }
    };
    let mut session = Session::new(invocation, stored_key);
    debug!(
        command = %session.invocation().command,
        paired = !session.client_key().is_empty(),
        "starting session"
    );

    let connection = transport::connect(&config.addr, config.socks5_proxy.as_deref()).await?;
    let (mut sink, mut stream) = connection.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if let Err(e) = sink.send(frame).await {
                debug!("write failed: {}", e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    let handshake = session.handshake();
    let (done_tx, mut done_rx) = oneshot::channel();
    let reader_tx = out_tx.clone();
    let reader = tokio::spawn(async move {
        let result = read_loop(&mut stream, &mut session, &store, &reader_tx).await;
        let _ = done_tx.send(result);
    });

    send(&out_tx, &handshake)?;

    tokio::pin!(shutdown);
    let finished = tokio::select! {
        result = &mut done_rx => Some(result),
        _ = &mut shutdown => None,
    };

    let result = match finished {
        Some(result) => {
            let outcome = result.unwrap_or(Err(SessionError::ConnectionClosed))?;
            let _ = out_tx.send(transport::close_frame());
            let _ = tokio::time::timeout(config.close_timeout, writer).await;
            Ok(RunResult::Completed(outcome))
        }
        None => {
            info!("Interrupted, closing connection");
            let _ = out_tx.send(transport::close_frame());
            if tokio::time::timeout(config.close_timeout, &mut done_rx)
                .await
                .is_err()
            {
                debug!("close handshake timed out");
            }
            Ok(RunResult::Interrupted)
        }
    };

    reader.abort();
    result
}

async fn read_loop<S: CredentialStore>(
    stream: &mut SplitStream<Connection>,
    session: &mut Session,
    store: &S,
    out: &mpsc::UnboundedSender<Message>,
) -> Result<Outcome, SessionError> {
    while let Some(frame) = stream.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(frame) => {
                debug!(?frame, "TV closed the connection");
                break;
            }
            _ => continue,
        };
        trace!(frame = %text.as_str(), "inbound");

        for effect in session.handle_text(text.as_str())? {
            match effect {
                Effect::Send(message) => send(out, &message)?,
                Effect::Persist(key) => {
                    // the key stays valid for this run even if it cannot be cached
                    if let Err(e) = store.save(&key) {
                        warn!("Failed to save client key: {}", e);
                    }
                }
                Effect::Complete(outcome) => return Ok(outcome),
            }
        }
    }
    Err(SessionError::ConnectionClosed)
}

fn send(
    out: &mpsc::UnboundedSender<Message>,
    message: &OutboundMessage,
) -> Result<(), SessionError> {
    trace!(id = %message.id, "outbound");
    out.send(transport::encode(message)?)
        .map_err(|_| SessionError::ConnectionClosed)
}
