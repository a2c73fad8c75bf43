pub mod game_flow;
pub mod notifier;

pub use game_flow::{GameFlowService, Registration, SubmitOutcome};
pub use notifier::{NoopNotifier, Notifier, NotifyEvent, RecordingNotifier};
