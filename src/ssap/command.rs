use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use super::protocol::OutboundMessage;
use crate::error::SessionError;

/// Correlation id of the app-list request issued to resolve an app name
pub const RESOLVE_APP_ID: &str = "req_resolve_app";

const LIST_APPS_URI: &str = "ssap://com.webos.applicationManager/listApps";

/// Command selected on the command line. Exactly one runs per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    InitializeKey,
    Info,
    ListApps,
    Launch,
    Close,
    VolGet,
    VolSet,
    VolUp,
    VolDown,
    Mute,
    UnMute,
    ChanGet,
    ChanUp,
    ChanDown,
    Toast,
    TurnOff,
    ListInputs,
    SetInput,
    Play,
    Pause,
    Stop,
    Rewind,
    FastForward,
}

impl Command {
    pub const ALL: [Command; 23] = [
        Command::InitializeKey,
        Command::Info,
        Command::ListApps,
        Command::Launch,
        Command::Close,
        Command::VolGet,
        Command::VolSet,
        Command::VolUp,
        Command::VolDown,
        Command::Mute,
        Command::UnMute,
        Command::ChanGet,
        Command::ChanUp,
        Command::ChanDown,
        Command::Toast,
        Command::TurnOff,
        Command::ListInputs,
        Command::SetInput,
        Command::Play,
        Command::Pause,
        Command::Stop,
        Command::Rewind,
        Command::FastForward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::InitializeKey => "initialize-key",
            Command::Info => "info",
            Command::ListApps => "list-apps",
            Command::Launch => "launch",
            Command::Close => "close",
            Command::VolGet => "vol-get",
            Command::VolSet => "vol-set",
            Command::VolUp => "vol-up",
            Command::VolDown => "vol-down",
            Command::Mute => "mute",
            Command::UnMute => "un-mute",
            Command::ChanGet => "chan-get",
            Command::ChanUp => "chan-up",
            Command::ChanDown => "chan-down",
            Command::Toast => "toast",
            Command::TurnOff => "turn-off",
            Command::ListInputs => "list-inputs",
            Command::SetInput => "set-input",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Rewind => "rewind",
            Command::FastForward => "fast-forward",
        }
    }

    /// Endpoint URI and correlation id. `None` for `initialize-key`, which sends no request.
    pub fn endpoint(self) -> Option<(&'static str, &'static str)> {
        Some(match self {
            Command::InitializeKey => return None,
            Command::Info => ("ssap://system/getSystemInfo", "req_info"),
            Command::ListApps => (LIST_APPS_URI, "req_list_apps"),
            Command::Launch => ("ssap://system.launcher/launch", "req_launch"),
            Command::Close => ("ssap://system.launcher/close", "req_close"),
            Command::VolGet => ("ssap://audio/getVolume", "req_vol_get"),
            Command::VolSet => ("ssap://audio/setVolume", "req_vol_set"),
            Command::VolUp => ("ssap://audio/volumeUp", "req_vol_up"),
            Command::VolDown => ("ssap://audio/volumeDown", "req_vol_down"),
            Command::Mute => ("ssap://audio/setMute", "req_mute"),
            Command::UnMute => ("ssap://audio/setMute", "req_unmute"),
            Command::ChanGet => ("ssap://tv/getCurrentChannel", "req_chan_get"),
            Command::ChanUp => ("ssap://tv/channelUp", "req_chan_up"),
            Command::ChanDown => ("ssap://tv/channelDown", "req_chan_down"),
            Command::Toast => ("ssap://system.notifications/createToast", "req_toast"),
            Command::TurnOff => ("ssap://system/turnOff", "req_turn_off"),
            Command::ListInputs => ("ssap://tv/getExternalInputList", "req_list_inputs"),
            Command::SetInput => ("ssap://tv/switchInput", "req_set_input"),
            Command::Play => ("ssap://media.controls/play", "req_play"),
            Command::Pause => ("ssap://media.controls/pause", "req_pause"),
            Command::Stop => ("ssap://media.controls/stop", "req_stop"),
            Command::Rewind => ("ssap://media.controls/rewind", "req_rewind"),
            Command::FastForward => ("ssap://media.controls/fastForward", "req_fast_forward"),
        })
    }

    /// Usage line shown in `--help`
    pub fn example(self) -> &'static str {
        match self {
            Command::Launch => "--cmd launch --arg youtube [--payload '{\"contentId\":\"...\"}']",
            Command::Close => "--cmd close --arg youtube",
            Command::VolSet => "--cmd vol-set --arg 20",
            Command::Toast => "--cmd toast --arg \"Hello World\"",
            Command::SetInput => "--cmd set-input --arg HDMI_1",
            _ => "",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = SessionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| SessionError::UnknownCommand(name.to_string()))
    }
}

/// Whether a response to `id` carries data worth printing rather than a bare acknowledgment
pub fn is_query_id(id: &str) -> bool {
    id.ends_with("_get") || matches!(id, "req_info" | "req_list_apps" | "req_list_inputs")
}

/// App-targeted action deferred until the app name has been resolved to an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub command: Command,
    pub app: String,
    /// Endpoint URI and correlation id of the deferred request
    pub endpoint: (&'static str, &'static str),
}

/// What to put on the wire once the handshake completes
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Nothing to send (`initialize-key`)
    Nothing,
    Request(OutboundMessage),
    /// Send the app-list request first; the action waits in `pending`
    Resolve {
        pending: PendingAction,
        request: OutboundMessage,
    },
}

/// A command together with its validated arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub argument: String,
    /// Extra launch parameters, merged under `params` on the launch request
    pub launch_params: Option<Map<String, Value>>,
}

impl Invocation {
    /// Validate arguments up front so nothing malformed ever reaches the TV.
    pub fn new(
        command: Command,
        argument: impl Into<String>,
        payload: Option<&str>,
    ) -> Result<Self, SessionError> {
        let argument = argument.into();

        let what = match command {
            Command::Toast => Some("toast message"),
            Command::SetInput => Some("input id"),
            Command::Launch | Command::Close => Some("app name or id"),
            _ => None,
        };
        if let Some(what) = what {
            if argument.is_empty() {
                return Err(SessionError::MissingArgument {
                    command: command.name(),
                    what,
                });
            }
        }

        let launch_params = match (command, payload) {
            (Command::Launch, Some(raw)) if !raw.is_empty() => Some(parse_launch_params(raw)?),
            _ => None,
        };

        Ok(Self {
            command,
            argument,
            launch_params,
        })
    }

    /// Build the first request of this run.
    pub fn dispatch(&self) -> Dispatch {
        let Some((uri, id)) = self.command.endpoint() else {
            return Dispatch::Nothing;
        };

        let payload = match self.command {
            Command::VolSet => json!({ "volume": parse_volume(&self.argument) }),
            Command::Mute => json!({ "mute": true }),
            Command::UnMute => json!({ "mute": false }),
            Command::Toast => json!({ "message": self.argument }),
            Command::SetInput => json!({ "inputId": self.argument }),
            Command::Launch | Command::Close => {
                let pending = PendingAction {
                    command: self.command,
                    app: self.argument.clone(),
                    endpoint: (uri, id),
                };
                if looks_like_app_id(&self.argument) {
                    return Dispatch::Request(self.app_action(&pending, &self.argument));
                }
                return Dispatch::Resolve {
                    pending,
                    request: OutboundMessage::request(LIST_APPS_URI, RESOLVE_APP_ID, Value::Null),
                };
            }
            _ => Value::Null,
        };

        Dispatch::Request(OutboundMessage::request(uri, id, payload))
    }

    /// Launch or close request for an already-resolved app id.
    pub fn app_action(&self, action: &PendingAction, app_id: &str) -> OutboundMessage {
        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::String(app_id.to_string()));
        if let (Command::Launch, Some(params)) = (action.command, &self.launch_params) {
            payload.insert("params".to_string(), Value::Object(params.clone()));
        }

        let (uri, id) = action.endpoint;
        OutboundMessage::request(uri, id, Value::Object(payload))
    }
}

/// Anything with a dot is taken to be a fully-qualified app id ("com.webos.app.browser").
fn looks_like_app_id(argument: &str) -> bool {
    argument.contains('.')
}

/// Non-numeric input is deliberately treated as 0 rather than rejected.
fn parse_volume(argument: &str) -> i64 {
    argument.parse().unwrap_or(0)
}

fn parse_launch_params(raw: &str) -> Result<Map<String, Value>, SessionError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SessionError::InvalidPayload(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(SessionError::InvalidPayload(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(command: Command, argument: &str) -> OutboundMessage {
        match Invocation::new(command, argument, None).unwrap().dispatch() {
            Dispatch::Request(request) => request,
            other => panic!("expected a direct request, got {other:?}"),
        }
    }

    #[test]
    fn every_name_round_trips_through_from_str() {
        for command in Command::ALL {
            assert_eq!(command.name().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = "volume-max".parse::<Command>().unwrap_err();
        assert!(matches!(err, SessionError::UnknownCommand(name) if name == "volume-max"));
    }

    #[test]
    fn correlation_ids_are_unique() {
        let mut ids: Vec<&str> = Command::ALL
            .into_iter()
            .filter_map(|c| c.endpoint().map(|(_, id)| id))
            .collect();
        ids.push(RESOLVE_APP_ID);
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn every_command_except_initialize_key_maps_to_its_endpoint() {
        let cases = [
            (Command::Info, "", "ssap://system/getSystemInfo"),
            (Command::ListApps, "", "ssap://com.webos.applicationManager/listApps"),
            (Command::Launch, "com.webos.app.browser", "ssap://system.launcher/launch"),
            (Command::Close, "com.webos.app.browser", "ssap://system.launcher/close"),
            (Command::VolGet, "", "ssap://audio/getVolume"),
            (Command::VolSet, "10", "ssap://audio/setVolume"),
            (Command::VolUp, "", "ssap://audio/volumeUp"),
            (Command::VolDown, "", "ssap://audio/volumeDown"),
            (Command::Mute, "", "ssap://audio/setMute"),
            (Command::UnMute, "", "ssap://audio/setMute"),
            (Command::ChanGet, "", "ssap://tv/getCurrentChannel"),
            (Command::ChanUp, "", "ssap://tv/channelUp"),
            (Command::ChanDown, "", "ssap://tv/channelDown"),
            (Command::Toast, "hi", "ssap://system.notifications/createToast"),
            (Command::TurnOff, "", "ssap://system/turnOff"),
            (Command::ListInputs, "", "ssap://tv/getExternalInputList"),
            (Command::SetInput, "HDMI_1", "ssap://tv/switchInput"),
            (Command::Play, "", "ssap://media.controls/play"),
            (Command::Pause, "", "ssap://media.controls/pause"),
            (Command::Stop, "", "ssap://media.controls/stop"),
            (Command::Rewind, "", "ssap://media.controls/rewind"),
            (Command::FastForward, "", "ssap://media.controls/fastForward"),
        ];
        assert_eq!(cases.len(), Command::ALL.len() - 1);

        for (command, argument, uri) in cases {
            let request = request_for(command, argument);
            assert_eq!(request.uri.as_deref(), Some(uri), "{command}");
            assert!(request.id.starts_with("req_"), "{command}");
        }
    }

    #[test]
    fn initialize_key_dispatches_nothing() {
        let invocation = Invocation::new(Command::InitializeKey, "", None).unwrap();
        assert_eq!(invocation.dispatch(), Dispatch::Nothing);
    }

    #[test]
    fn no_argument_commands_send_null_payload() {
        for command in [Command::Info, Command::VolUp, Command::TurnOff, Command::Play] {
            assert_eq!(request_for(command, "").payload, Value::Null);
        }
    }

    #[test]
    fn mute_and_unmute_send_literal_flags() {
        let mute = request_for(Command::Mute, "");
        let unmute = request_for(Command::UnMute, "");
        assert_eq!(mute.payload, json!({"mute": true}));
        assert_eq!(mute.id, "req_mute");
        assert_eq!(unmute.payload, json!({"mute": false}));
        assert_eq!(unmute.id, "req_unmute");
    }

    #[test]
    fn vol_set_parses_integer() {
        assert_eq!(request_for(Command::VolSet, "20").payload, json!({"volume": 20}));
        assert_eq!(request_for(Command::VolSet, "-3").payload, json!({"volume": -3}));
    }

    #[test]
    fn vol_set_coerces_non_numeric_to_zero() {
        assert_eq!(request_for(Command::VolSet, "abc").payload, json!({"volume": 0}));
        assert_eq!(request_for(Command::VolSet, "").payload, json!({"volume": 0}));
    }

    #[test]
    fn toast_requires_message() {
        let err = Invocation::new(Command::Toast, "", None).unwrap_err();
        assert!(matches!(err, SessionError::MissingArgument { command: "toast", .. }));
    }

    #[test]
    fn set_input_requires_input_id() {
        let err = Invocation::new(Command::SetInput, "", None).unwrap_err();
        assert!(matches!(err, SessionError::MissingArgument { command: "set-input", .. }));
        let request = request_for(Command::SetInput, "HDMI_2");
        assert_eq!(request.payload, json!({"inputId": "HDMI_2"}));
    }

    #[test]
    fn toast_wire_form() {
        let request = request_for(Command::Toast, "Hello World");
        let json = serde_json::to_string_pretty(&request).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "type": "request",
          "id": "req_toast",
          "uri": "ssap://system.notifications/createToast",
          "payload": {
            "message": "Hello World"
          }
        }
        "#);
    }

    #[test]
    fn dotted_launch_argument_skips_resolution() {
        let request = request_for(Command::Launch, "com.webos.app.test");
        assert_eq!(request.id, "req_launch");
        assert_eq!(request.payload, json!({"id": "com.webos.app.test"}));
    }

    #[test]
    fn plain_app_name_defers_action_behind_app_list() {
        let invocation = Invocation::new(Command::Close, "Netflix", None).unwrap();
        match invocation.dispatch() {
            Dispatch::Resolve { pending, request } => {
                assert_eq!(
                    pending,
                    PendingAction {
                        command: Command::Close,
                        app: "Netflix".to_string(),
                        endpoint: ("ssap://system.launcher/close", "req_close"),
                    }
                );
                assert_eq!(request.id, RESOLVE_APP_ID);
                assert_eq!(request.uri.as_deref(), Some(LIST_APPS_URI));
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn launch_and_close_require_an_app() {
        assert!(Invocation::new(Command::Launch, "", None).is_err());
        assert!(Invocation::new(Command::Close, "", None).is_err());
    }

    fn pending_for(invocation: &Invocation) -> PendingAction {
        match invocation.dispatch() {
            Dispatch::Resolve { pending, .. } => pending,
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn launch_params_are_merged_under_params() {
        let invocation = Invocation::new(
            Command::Launch,
            "youtube",
            Some(r#"{"contentId":"dQw4w9WgXcQ"}"#),
        )
        .unwrap();
        let pending = pending_for(&invocation);
        let request = invocation.app_action(&pending, "youtube.leanback.v4");
        assert_eq!(request.uri.as_deref(), Some("ssap://system.launcher/launch"));
        assert_eq!(request.id, "req_launch");
        assert_eq!(
            request.payload,
            json!({"id": "youtube.leanback.v4", "params": {"contentId": "dQw4w9WgXcQ"}})
        );
    }

    #[test]
    fn close_never_carries_params() {
        let invocation = Invocation::new(Command::Close, "netflix", Some(r#"{"a":1}"#)).unwrap();
        let pending = pending_for(&invocation);
        let request = invocation.app_action(&pending, "netflix");
        assert_eq!(request.uri.as_deref(), Some("ssap://system.launcher/close"));
        assert_eq!(request.id, "req_close");
        assert_eq!(request.payload, json!({"id": "netflix"}));
    }

    #[test]
    fn resolved_action_uses_the_command_table_endpoint() {
        for command in [Command::Launch, Command::Close] {
            let invocation = Invocation::new(command, "netflix", None).unwrap();
            let pending = pending_for(&invocation);
            assert_eq!(Some(pending.endpoint), command.endpoint());
        }
    }

    #[test]
    fn invalid_launch_payload_is_rejected() {
        let err = Invocation::new(Command::Launch, "youtube", Some("{not json")).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPayload(_)));

        let err = Invocation::new(Command::Launch, "youtube", Some("[1, 2]")).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPayload(_)));
    }

    #[test]
    fn query_ids_are_recognised() {
        for id in ["req_info", "req_list_apps", "req_list_inputs", "req_vol_get", "req_chan_get"] {
            assert!(is_query_id(id), "{id}");
        }
        for id in ["req_toast", "req_vol_set", "req_launch", "req_mute"] {
            assert!(!is_query_id(id), "{id}");
        }
    }
}
