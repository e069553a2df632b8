pub mod events;
pub mod orchestrator;

pub use events::{HumanGate, SessionEvent, SessionPhase};
pub use orchestrator::FormSession;
