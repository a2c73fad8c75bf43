pub mod hub;
pub mod notifier;
pub mod protocol;
pub mod session;

pub use hub::{HubEvent, WsRegistry};
pub use notifier::WsNotifier;
pub use protocol::{ClientMsg, ServerMsg, PROTOCOL_VERSION};
