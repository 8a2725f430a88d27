use thiserror::Error;

use super::events::AdmissionEvent;
use super::states::AdmissionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} on {}", .event.event_type())]
    InvalidTransition {
        from: AdmissionState,
        event: AdmissionEvent,
    },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
