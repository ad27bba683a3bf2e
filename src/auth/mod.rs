pub mod gate;
pub mod policy;

pub use gate::{AdminGate, GateError, GateState};
pub use policy::{Access, AccessPolicy, AdminInbox};
