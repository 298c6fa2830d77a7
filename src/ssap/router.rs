use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info};

use super::command::{Dispatch, Invocation, PendingAction, RESOLVE_APP_ID, is_query_id};
use super::outcome::Outcome;
use super::protocol::OutboundMessage;
use crate::error::SessionError;

/// What the router decided for one inbound response
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Not the response we are waiting for
    Ignored,
    /// App resolved; send the deferred action
    Send(OutboundMessage),
    Complete(Outcome),
}

/// Correlates responses with the single outstanding request.
///
/// Owns the pending app action while an app name is being resolved. At most
/// two requests are ever issued per run, and the second only after the first
/// has been answered.
#[derive(Debug, Default)]
pub struct Router {
    outstanding: Option<String>,
    pending: Option<PendingAction>,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Vec<AppEntry>,
}

/// Fields of the wrong type read as absent; the entry itself must be an object
#[derive(Debug, Deserialize)]
struct AppEntry {
    #[serde(default, deserialize_with = "string_or_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    title: Option<String>,
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlation id of the request currently awaiting a response
    pub fn outstanding(&self) -> Option<&str> {
        self.outstanding.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Emit the first request for `invocation`. Returns `None` when there is nothing to send.
    pub fn start(&mut self, invocation: &Invocation) -> Option<OutboundMessage> {
        let request = match invocation.dispatch() {
            Dispatch::Nothing => return None,
            Dispatch::Request(request) => request,
            Dispatch::Resolve { pending, request } => {
                debug!(app = %pending.app, "resolving app name before {}", pending.command);
                self.pending = Some(pending);
                request
            }
        };
        self.outstanding = Some(request.id.clone());
        Some(request)
    }

    /// Handle a `response` message.
    pub fn route(
        &mut self,
        invocation: &Invocation,
        id: &str,
        payload: Value,
    ) -> Result<Route, SessionError> {
        if self.outstanding.as_deref() != Some(id) {
            debug!(id, "ignoring uncorrelated response");
            return Ok(Route::Ignored);
        }

        if id == RESOLVE_APP_ID {
            if let Some(pending) = self.pending.take() {
                let app_id = resolve_app(&payload, &pending.app)?;
                info!("Resolved '{}' to ID: {}", pending.app, app_id);
                let request = invocation.app_action(&pending, &app_id);
                self.outstanding = Some(request.id.clone());
                return Ok(Route::Send(request));
            }
        }

        self.outstanding = None;
        let command = invocation.command;
        if is_query_id(id) {
            Ok(Route::Complete(Outcome::Query { command, payload }))
        } else {
            Ok(Route::Complete(Outcome::Acknowledged { command }))
        }
    }
}

/// Find the first app whose title or id matches `wanted`, ignoring case.
fn resolve_app(payload: &Value, wanted: &str) -> Result<String, SessionError> {
    let list = AppList::deserialize(payload)
        .map_err(|e| SessionError::MalformedAppList(e.to_string()))?;

    let needle = wanted.to_lowercase();
    list.apps
        .into_iter()
        .filter_map(|app| {
            let id = app.id?;
            let title_matches = app
                .title
                .is_some_and(|title| title.to_lowercase() == needle);
            (title_matches || id.to_lowercase() == needle).then_some(id)
        })
        .next()
        .ok_or_else(|| SessionError::AppNotFound(wanted.to_string()))
}
