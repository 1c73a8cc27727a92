use chrono::Datelike;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

// ── Availability Checking ─────────────────────────────────────────

/// Validate a requested stay range before any availability math runs.
///
/// Check-out must be strictly after check-in (this also covers the
/// zero-night case — with date granularity, `check_out > check_in`
/// implies at least one night).
pub(crate) fn validate_stay(range: &StayRange) -> Result<(), EngineError> {
    if range.check_out <= range.check_in {
        return Err(EngineError::InvalidRange {
            check_in: range.check_in,
            check_out: range.check_out,
        });
    }
    if range.check_in.year() < EARLIEST_STAY_YEAR || range.check_out.year() > LATEST_STAY_YEAR {
        return Err(EngineError::LimitExceeded("stay dates out of range"));
    }
    if range.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// Find an active reservation conflicting with the candidate range.
///
/// A conflict is any Reserved or Checked-In reservation whose half-open
/// `[check_in, check_out)` interval overlaps the candidate:
/// `existing.check_in < candidate.check_out && existing.check_out > candidate.check_in`.
/// Checked-Out and Cancelled reservations never conflict, and neither does
/// exact-boundary adjacency (same-day turnover).
///
/// The whole active set for the room is scanned — several non-overlapping
/// active reservations may coexist on one room at different future dates.
pub(crate) fn find_conflict(
    rs: &RoomState,
    candidate: &StayRange,
    exclude: Option<Ulid>,
) -> Option<Ulid> {
    rs.overlapping(candidate)
        .find(|r| r.is_active() && Some(r.id) != exclude)
        .map(|r| r.id)
}

pub(crate) fn is_range_free(rs: &RoomState, candidate: &StayRange, exclude: Option<Ulid>) -> bool {
    find_conflict(rs, candidate, exclude).is_none()
}

/// Derive a room's occupancy status from its reservations.
///
/// Invoked by every lifecycle transition so the "any other active
/// reservation?" query lives in exactly one place:
/// - any Checked-In reservation → Occupied (physical occupancy),
/// - no active reservation at all → Available,
/// - only Reserved reservations → status left as it is.
///
/// `pending` overrides one reservation's status during the scan, so callers
/// can evaluate a transition before committing it.
pub(crate) fn recompute_room_status(
    rs: &RoomState,
    pending: Option<(Ulid, ReservationStatus)>,
) -> RoomStatus {
    let status_of = |r: &Reservation| match pending {
        Some((id, status)) if r.id == id => status,
        _ => r.status,
    };
    let mut any_active = false;
    for r in &rs.reservations {
        match status_of(r) {
            ReservationStatus::CheckedIn => return RoomStatus::Occupied,
            ReservationStatus::Reserved => any_active = true,
            _ => {}
        }
    }
    if any_active {
        rs.room.status
    } else {
        RoomStatus::Available
    }
}
