// Registration handshake: the fixed permission manifest and the register message

use serde_json::json;

use super::protocol::OutboundMessage;

/// Correlation id of the register message
pub const REGISTER_ID: &str = "register_0";

/// Permission scopes requested at pairing time. Covers every supported command.
pub const PERMISSIONS: [&str; 28] = [
    "READ_UPDATE_INFO",
    "READ_NETWORK_STATE",
    "READ_RUNNING_APPS",
    "READ_INSTALLED_APPS",
    "CONTROL_AUDIO",
    "CONTROL_INPUT_TEXT",
    "CONTROL_MOUSE",
    "CONTROL_POWER",
    "CONTROL_TV",
    "READ_APP_STATUS",
    "READ_CURRENT_CHANNEL",
    "READ_INPUT_DEVICE_LIST",
    "READ_TV_CHANNEL_LIST",
    "READ_VOLUME",
    "WRITE_NOTIFICATION_TOAST",
    "LAUNCH",
    "CONTROL_APP",
    "WEBAPP_LAUNCHER",
    "CONTROL_INPUT_MEDIA_PLAYBACK",
    "CHECK_BLUETOOTH_DEVICE",
    "CONTROL_BLUETOOTH",
    "READ_SETTINGS",
    "CONTROL_DISPLAY",
    "READ_LGE_SDX",
    "READ_NOTIFICATIONS",
    "WRITE_SETTINGS",
    "TEST_SECURE",
    "CONTROL_MOUSE_AND_KEYBOARD",
];

/// Build the register message. An empty `client_key` asks the TV to pair from scratch.
pub fn register_message(client_key: &str) -> OutboundMessage {
    OutboundMessage::register(
        REGISTER_ID,
        json!({
            "forcePairing": false,
            "pairingType": "PROMPT",
            "client-key": client_key,
            "manifest": {
                "manifestVersion": 1,
                "appVersion": "1.1",
                "permissions": PERMISSIONS,
            }
        }),
    )
}
