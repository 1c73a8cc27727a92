use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::ReservationStatus;

#[derive(Debug)]
pub enum EngineError {
    /// Referenced room, reservation, or staff member does not exist.
    NotFound(Ulid),
    /// Room number is already taken by another room.
    RoomNumberTaken(u32),
    /// Staff username is already taken.
    UsernameTaken(String),
    /// Check-out not strictly after check-in.
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    /// Requested range overlaps the identified active reservation.
    Conflict(Ulid),
    /// The lifecycle operation is not legal from the reservation's current status.
    InvalidTransition {
        operation: &'static str,
        current: ReservationStatus,
    },
    /// Internal consistency precondition violated — a defect, not user error.
    InvalidState(&'static str),
    /// Room still has active reservations and cannot be deleted.
    HasActiveReservations(Ulid),
    /// Administrator accounts cannot be deleted.
    AdminProtected(Ulid),
    /// Input failed validation.
    Validation(&'static str),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::RoomNumberTaken(n) => write!(f, "room number {n} already exists"),
            EngineError::UsernameTaken(name) => write!(f, "username already taken: {name}"),
            EngineError::InvalidRange { check_in, check_out } => write!(
                f,
                "check-out date must be after check-in date: [{check_in}, {check_out})"
            ),
            EngineError::Conflict(id) => {
                write!(f, "room is not available for the selected dates: conflicts with reservation {id}")
            }
            EngineError::InvalidTransition { operation, current } => {
                write!(f, "cannot {operation}: reservation status is {current}")
            }
            EngineError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            EngineError::HasActiveReservations(id) => {
                write!(f, "cannot delete room {id}: it has active reservations")
            }
            EngineError::AdminProtected(id) => {
                write!(f, "cannot delete administrator account {id}")
            }
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
