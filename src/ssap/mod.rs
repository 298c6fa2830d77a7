// SSAP protocol core
// Pairing handshake, request dispatch and response correlation for one command run

pub mod command;
pub mod manifest;
pub mod outcome;
pub mod protocol;
pub mod router;
pub mod session;

pub use command::{Command, Invocation};
pub use outcome::Outcome;
pub use protocol::{InboundMessage, OutboundMessage};
pub use session::{Effect, Phase, Session};
