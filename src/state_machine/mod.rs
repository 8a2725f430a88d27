// Admission and event lifecycle states.
//
// `AdmissionState` models one (user, event) pair: NONE -> WAITLISTED ->
// REGISTERED -> ATTENDED, with withdrawal back to NONE. `EventStatus` is the
// persisted event lifecycle that the scheduler advances.

pub mod errors;
pub mod events;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::AdmissionEvent;
pub use states::{AdmissionState, EventStatus, EventVisibility, RegistrationStatus};
