use serde_json::Value;
use tracing::{debug, info, trace};

use super::command::{Command, Invocation};
use super::manifest::{REGISTER_ID, register_message};
use super::outcome::Outcome;
use super::protocol::{InboundKind, InboundMessage, OutboundMessage};
use super::router::{Route, Router};
use crate::error::SessionError;

/// Where a run is in its lifecycle. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Handshaking,
    Ready,
    AppResolving,
    Acting,
    Done,
}

/// Side effect requested by the session; the driver carries them out in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(OutboundMessage),
    /// The TV issued a new client key that must be written to the credential store
    Persist(String),
    Complete(Outcome),
}

/// Protocol state for one command run.
///
/// Owns the client key and gates command dispatch on registration: nothing
/// but the register message is sent before the TV acknowledges it.
#[derive(Debug)]
pub struct Session {
    invocation: Invocation,
    client_key: String,
    phase: Phase,
    router: Router,
}

impl Session {
    /// `initialize-key` always starts unpaired so the TV issues a fresh key.
    pub fn new(invocation: Invocation, stored_key: Option<String>) -> Self {
        let client_key = match invocation.command {
            Command::InitializeKey => String::new(),
            _ => stored_key.unwrap_or_default(),
        };
        Self {
            invocation,
            client_key,
            phase: Phase::Connecting,
            router: Router::new(),
        }
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Build the register message and start waiting for the acknowledgment.
    pub fn handshake(&mut self) -> OutboundMessage {
        self.phase = Phase::Handshaking;
        register_message(&self.client_key)
    }

    /// Feed one inbound text frame through the state machine.
    ///
    /// Frames that are not valid SSAP messages are skipped. An `error` message
    /// is fatal whatever the phase.
    pub fn handle_text(&mut self, text: &str) -> Result<Vec<Effect>, SessionError> {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "skipping unparsable frame");
                return Ok(Vec::new());
            }
        };

        if self.phase == Phase::Done {
            trace!(?message.kind, "run already complete, ignoring");
            return Ok(Vec::new());
        }

        match message.kind {
            InboundKind::Error => {
                self.phase = Phase::Done;
                Err(SessionError::Device(text.trim().to_string()))
            }
            InboundKind::Registered => Ok(self.on_registered(message.payload)),
            InboundKind::Response => {
                let id = message.id.unwrap_or_default();
                self.on_response(&id, message.payload)
            }
            InboundKind::Other => Ok(Vec::new()),
        }
    }

    fn on_registered(&mut self, payload: Value) -> Vec<Effect> {
        if self.phase != Phase::Handshaking {
            debug!(phase = ?self.phase, "ignoring repeated registration");
            return Vec::new();
        }
        info!("Registered successfully!");

        let mut effects = Vec::new();
        if let Some(key) = payload.get("client-key").and_then(Value::as_str) {
            if key != self.client_key {
                info!("Received new client key");
                debug!(key, "new client key");
                self.client_key = key.to_string();
                effects.push(Effect::Persist(self.client_key.clone()));
            }
        }

        self.phase = Phase::Ready;
        match self.router.start(&self.invocation) {
            Some(request) => {
                self.phase = if self.router.pending().is_some() {
                    Phase::AppResolving
                } else {
                    Phase::Acting
                };
                debug!(id = %request.id, uri = ?request.uri, "sending request");
                effects.push(Effect::Send(request));
            }
            None => {
                self.phase = Phase::Done;
                effects.push(Effect::Complete(Outcome::KeyInitialized));
            }
        }
        effects
    }

    fn on_response(&mut self, id: &str, payload: Value) -> Result<Vec<Effect>, SessionError> {
        if self.phase == Phase::Handshaking {
            if id == REGISTER_ID && payload.get("pairingType").and_then(Value::as_str) == Some("PROMPT") {
                info!("Please accept the pairing prompt on the TV");
            }
            return Ok(Vec::new());
        }

        let route = self.router.route(&self.invocation, id, payload);
        match route {
            Ok(Route::Ignored) => Ok(Vec::new()),
            Ok(Route::Send(request)) => {
                self.phase = Phase::Acting;
                debug!(id = %request.id, uri = ?request.uri, "sending request");
                Ok(vec![Effect::Send(request)])
            }
            Ok(Route::Complete(outcome)) => {
                self.phase = Phase::Done;
                Ok(vec![Effect::Complete(outcome)])
            }
            Err(e) => {
                self.phase = Phase::Done;
                Err(e)
            }
        }
    }
}
