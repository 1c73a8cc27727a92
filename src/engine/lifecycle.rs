use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{find_conflict, recompute_room_status, validate_stay};
use super::{Engine, EngineError};

/// Partial room update; absent fields keep their current value.
#[derive(Debug, Default, Clone)]
pub struct RoomPatch {
    pub number: Option<u32>,
    pub room_type: Option<String>,
    pub price_per_night: Option<Money>,
    pub status: Option<RoomStatus>,
}

/// Actual nights stayed: both timestamps normalized to calendar days, with a
/// one-night floor so a same-day checkout is never billed zero.
fn actual_nights(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    (check_out.date_naive() - check_in.date_naive())
        .num_days()
        .max(1)
}

fn validate_room_fields(number: u32, room_type: &str, price: Money) -> Result<(), EngineError> {
    if number == 0 {
        return Err(EngineError::Validation("room number must be positive"));
    }
    if room_type.trim().is_empty() {
        return Err(EngineError::Validation("room type must not be empty"));
    }
    if room_type.len() > MAX_ROOM_TYPE_LEN {
        return Err(EngineError::LimitExceeded("room type too long"));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(EngineError::Validation("price per night must be positive"));
    }
    Ok(())
}

impl Engine {
    // ── Room CRUD ────────────────────────────────────────

    pub async fn create_room(
        &self,
        number: u32,
        room_type: String,
        price_per_night: Money,
    ) -> Result<Room, EngineError> {
        validate_room_fields(number, &room_type, price_per_night)?;
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if self.room_numbers.contains_key(&number) {
            return Err(EngineError::RoomNumberTaken(number));
        }

        let room = Room {
            id: Ulid::new(),
            number,
            room_type,
            price_per_night,
            status: RoomStatus::Available,
        };
        let event = Event::RoomCreated { room: room.clone() };
        self.wal_append(&event).await?;
        self.room_numbers.insert(number, room.id);
        self.rooms
            .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
        Ok(room)
    }

    pub async fn update_room(&self, id: Ulid, patch: RoomPatch) -> Result<Room, EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = rs.write().await;

        let old_number = guard.room.number;
        let number = patch.number.unwrap_or(old_number);
        let room_type = patch
            .room_type
            .unwrap_or_else(|| guard.room.room_type.clone());
        let price_per_night = patch.price_per_night.unwrap_or(guard.room.price_per_night);
        let status = patch.status.unwrap_or(guard.room.status);
        validate_room_fields(number, &room_type, price_per_night)?;

        if number != old_number
            && self.room_numbers.get(&number).is_some_and(|e| *e.value() != id)
        {
            return Err(EngineError::RoomNumberTaken(number));
        }

        let event = Event::RoomUpdated {
            id,
            number,
            room_type,
            price_per_night,
            status,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        if number != old_number {
            self.room_numbers.remove(&old_number);
            self.room_numbers.insert(number, id);
        }
        Ok(guard.room.clone())
    }

    /// Delete a room. Refused while any Reserved or Checked-In reservation
    /// still references it; historical (terminal) reservations go with the room.
    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.write().await;
        if guard.active_count(None) > 0 {
            return Err(EngineError::HasActiveReservations(id));
        }

        let event = Event::RoomDeleted { id };
        self.wal_append(&event).await?;
        self.room_numbers.remove(&guard.room.number);
        for r in &guard.reservations {
            self.reservation_index.remove(&r.id);
        }
        drop(guard);
        self.rooms.remove(&id);
        Ok(())
    }

    // ── Reservation lifecycle ────────────────────────────

    /// Create a reservation in status Reserved.
    ///
    /// Holds the room's write lock across the availability check and the
    /// insert, so two overlapping create calls for the same room serialize
    /// and the loser sees the winner's reservation.
    ///
    /// Room status is untouched here: a future booking is not physical
    /// occupancy, and the room stays bookable for other date ranges.
    pub async fn create_reservation(
        &self,
        room_id: Ulid,
        guest_name: String,
        guest_phone: Option<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<ReservationView, EngineError> {
        let guest_name = guest_name.trim().to_string();
        if guest_name.is_empty() {
            return Err(EngineError::Validation("guest name is required"));
        }
        if guest_name.len() > MAX_GUEST_NAME_LEN {
            return Err(EngineError::LimitExceeded("guest name too long"));
        }
        if let Some(ref phone) = guest_phone
            && phone.len() > MAX_GUEST_PHONE_LEN
        {
            return Err(EngineError::LimitExceeded("guest phone too long"));
        }

        let rs = self.get_room(&room_id).ok_or(EngineError::NotFound(room_id))?;
        let mut guard = rs.write().await;
        if guard.reservations.len() >= MAX_RESERVATIONS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many reservations on room"));
        }

        let stay = StayRange { check_in, check_out };
        validate_stay(&stay)?;
        if let Some(existing) = find_conflict(&guard, &stay, None) {
            return Err(EngineError::Conflict(existing));
        }

        let total_amount = stay.nights() as Money * guard.room.price_per_night;
        let reservation = Reservation {
            id: Ulid::new(),
            room_id,
            guest_name,
            guest_phone,
            check_in,
            check_out,
            actual_check_in: None,
            actual_check_out: None,
            status: ReservationStatus::Reserved,
            total_amount,
            created_at: Utc::now(),
        };

        let event = Event::ReservationCreated {
            reservation: reservation.clone(),
        };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(ReservationView {
            reservation,
            room: RoomRef::of(&guard.room),
        })
    }

    /// Check a guest in. Only a Reserved reservation can be checked in.
    ///
    /// The total is re-priced from the originally booked range at the room's
    /// current nightly price — deliberately not a snapshot of the price at
    /// booking time.
    pub async fn check_in(&self, reservation_id: Ulid) -> Result<ReservationView, EngineError> {
        self.check_in_at(reservation_id, Utc::now()).await
    }

    pub(crate) async fn check_in_at(
        &self,
        reservation_id: Ulid,
        at: DateTime<Utc>,
    ) -> Result<ReservationView, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&reservation_id).await?;
        let reservation = guard
            .reservation(reservation_id)
            .ok_or(EngineError::NotFound(reservation_id))?;
        if reservation.status != ReservationStatus::Reserved {
            return Err(EngineError::InvalidTransition {
                operation: "check in",
                current: reservation.status,
            });
        }

        let nights_booked = reservation.stay().nights();
        let total_amount = nights_booked as Money * guard.room.price_per_night;
        let room_status =
            recompute_room_status(&guard, Some((reservation_id, ReservationStatus::CheckedIn)));

        let event = Event::ReservationCheckedIn {
            id: reservation_id,
            room_id,
            at,
            total_amount,
            room_status,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        view_of(&guard, reservation_id)
    }

    /// Check a guest out. Only a Checked-In reservation can be checked out.
    ///
    /// The total is recomputed from the *actual* stay at the room's current
    /// price: calendar-day difference of the actual timestamps, floored to one
    /// night. The room is released only if no other active reservation holds it.
    pub async fn check_out(&self, reservation_id: Ulid) -> Result<ReservationView, EngineError> {
        self.check_out_at(reservation_id, Utc::now()).await
    }

    pub(crate) async fn check_out_at(
        &self,
        reservation_id: Ulid,
        at: DateTime<Utc>,
    ) -> Result<ReservationView, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&reservation_id).await?;
        let reservation = guard
            .reservation(reservation_id)
            .ok_or(EngineError::NotFound(reservation_id))?;
        if reservation.status != ReservationStatus::CheckedIn {
            return Err(EngineError::InvalidTransition {
                operation: "check out",
                current: reservation.status,
            });
        }
        // Unreachable given the state machine; billing must not proceed
        // without the actual check-in timestamp.
        let checked_in_at = reservation
            .actual_check_in
            .ok_or(EngineError::InvalidState("actual check-in missing at check-out"))?;

        let nights = actual_nights(checked_in_at, at);
        let total_amount = nights as Money * guard.room.price_per_night;
        let room_status =
            recompute_room_status(&guard, Some((reservation_id, ReservationStatus::CheckedOut)));

        let event = Event::ReservationCheckedOut {
            id: reservation_id,
            room_id,
            at,
            total_amount,
            room_status,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        view_of(&guard, reservation_id)
    }

    /// Cancel a Reserved or Checked-In reservation. The total amount is left
    /// as it was; the room is released if no other active reservation holds it.
    pub async fn cancel_reservation(
        &self,
        reservation_id: Ulid,
    ) -> Result<ReservationView, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&reservation_id).await?;
        let reservation = guard
            .reservation(reservation_id)
            .ok_or(EngineError::NotFound(reservation_id))?;
        if !reservation.status.is_active() {
            return Err(EngineError::InvalidTransition {
                operation: "cancel",
                current: reservation.status,
            });
        }

        let room_status =
            recompute_room_status(&guard, Some((reservation_id, ReservationStatus::Cancelled)));

        let event = Event::ReservationCancelled {
            id: reservation_id,
            room_id,
            room_status,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        view_of(&guard, reservation_id)
    }

    // ── Staff accounts ───────────────────────────────────

    pub async fn create_staff(
        &self,
        username: String,
        password_hash: String,
        role: Role,
    ) -> Result<StaffInfo, EngineError> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(EngineError::Validation("username is required"));
        }
        if username.len() > MAX_USERNAME_LEN {
            return Err(EngineError::LimitExceeded("username too long"));
        }
        if self.staff.len() >= MAX_STAFF {
            return Err(EngineError::LimitExceeded("too many staff accounts"));
        }
        if self.usernames.contains_key(&username) {
            return Err(EngineError::UsernameTaken(username));
        }

        let member = StaffMember {
            id: Ulid::new(),
            username: username.clone(),
            password_hash,
            role,
            created_at: Utc::now(),
        };
        let event = Event::StaffCreated {
            staff: member.clone(),
        };
        self.wal_append(&event).await?;
        self.usernames.insert(username, member.id);
        let info = StaffInfo {
            id: member.id,
            username: member.username.clone(),
        };
        self.staff.insert(member.id, member);
        Ok(info)
    }

    pub async fn delete_staff(&self, id: Ulid) -> Result<(), EngineError> {
        let member = self
            .staff
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(id))?;
        if member.role == Role::Admin {
            return Err(EngineError::AdminProtected(id));
        }

        let event = Event::StaffDeleted { id };
        self.wal_append(&event).await?;
        self.staff.remove(&id);
        self.usernames.remove(&member.username);
        Ok(())
    }

    /// Seed the configured administrator account if no admin exists yet.
    /// Returns true if an account was created.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<bool, EngineError> {
        let has_admin = self.staff.iter().any(|e| e.value().role == Role::Admin);
        if has_admin {
            return Ok(false);
        }
        self.create_staff(username.to_string(), password_hash, Role::Admin)
            .await?;
        Ok(true)
    }
}

fn view_of(rs: &RoomState, reservation_id: Ulid) -> Result<ReservationView, EngineError> {
    let reservation = rs
        .reservation(reservation_id)
        .ok_or(EngineError::NotFound(reservation_id))?
        .clone();
    Ok(ReservationView {
        reservation,
        room: RoomRef::of(&rs.room),
    })
}
