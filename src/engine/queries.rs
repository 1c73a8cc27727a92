use ulid::Ulid;

use crate::model::*;

use super::availability;
use super::{Engine, EngineError, SharedRoomState};

impl Engine {
    pub async fn list_rooms(&self) -> Vec<Room> {
        let states: Vec<SharedRoomState> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut rooms = Vec::with_capacity(states.len());
        for rs in states {
            rooms.push(rs.read().await.room.clone());
        }
        rooms.sort_by_key(|r| r.number);
        rooms
    }

    pub async fn get_room_record(&self, id: Ulid) -> Result<Room, EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        Ok(guard.room.clone())
    }

    /// The availability contract: is `range` free on this room, ignoring
    /// `exclude` if given? Checked-Out and Cancelled reservations never count.
    pub async fn is_range_free(
        &self,
        room_id: Ulid,
        range: StayRange,
        exclude: Option<Ulid>,
    ) -> Result<bool, EngineError> {
        let rs = self.get_room(&room_id).ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        Ok(availability::is_range_free(&guard, &range, exclude))
    }

    /// All reservations across all rooms with their room references expanded,
    /// most recently created first.
    pub async fn list_reservations(&self) -> Vec<ReservationView> {
        let states: Vec<SharedRoomState> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut views = Vec::new();
        for rs in states {
            let guard = rs.read().await;
            let room = RoomRef::of(&guard.room);
            for r in &guard.reservations {
                views.push(ReservationView {
                    reservation: r.clone(),
                    room: room.clone(),
                });
            }
        }
        views.sort_by(|a, b| b.reservation.created_at.cmp(&a.reservation.created_at));
        views
    }

    pub async fn get_reservation(&self, id: Ulid) -> Result<ReservationView, EngineError> {
        let room_id = self
            .room_id_for_reservation(&id)
            .ok_or(EngineError::NotFound(id))?;
        let rs = self.get_room(&room_id).ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        let reservation = guard
            .reservation(id)
            .ok_or(EngineError::NotFound(id))?
            .clone();
        Ok(ReservationView {
            reservation,
            room: RoomRef::of(&guard.room),
        })
    }

    // ── Staff ────────────────────────────────────────────

    /// STAFF-role accounts only; administrators are not listed.
    pub fn list_staff(&self) -> Vec<StaffInfo> {
        let mut staff: Vec<StaffInfo> = self
            .staff
            .iter()
            .filter(|e| e.value().role == Role::Staff)
            .map(|e| StaffInfo {
                id: e.value().id,
                username: e.value().username.clone(),
            })
            .collect();
        staff.sort_by(|a, b| a.username.cmp(&b.username));
        staff
    }

    pub fn find_staff_by_username(&self, username: &str) -> Option<StaffMember> {
        let id = *self.usernames.get(username)?.value();
        self.staff.get(&id).map(|e| e.value().clone())
    }

    // ── Dashboard ────────────────────────────────────────

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let states: Vec<SharedRoomState> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let total_rooms = states.len();
        let mut occupied_rooms = 0usize;
        let mut active_reservations = 0usize;
        let mut currently_checked_in_guests = 0usize;
        let mut recent: Vec<(Reservation, RoomRef)> = Vec::new();

        for rs in states {
            let guard = rs.read().await;
            if guard.room.status == RoomStatus::Occupied {
                occupied_rooms += 1;
            }
            let room = RoomRef::of(&guard.room);
            for r in &guard.reservations {
                if r.is_active() {
                    active_reservations += 1;
                }
                if r.status == ReservationStatus::CheckedIn {
                    currently_checked_in_guests += 1;
                }
                recent.push((r.clone(), room.clone()));
            }
        }

        let occupancy_rate = if total_rooms > 0 {
            (occupied_rooms as f64 / total_rooms as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        recent.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        let recent_activities = recent
            .into_iter()
            .take(3)
            .map(|(r, room)| Activity {
                id: r.id,
                message: format!(
                    "New reservation by {} for Room {} ({}) on {}.",
                    r.guest_name,
                    room.number,
                    room.room_type,
                    r.created_at.format("%Y-%m-%d")
                ),
                timestamp: r.created_at,
            })
            .collect();

        DashboardStats {
            total_rooms,
            active_reservations,
            staff_members: self
                .staff
                .iter()
                .filter(|e| e.value().role == Role::Staff)
                .count(),
            occupancy_rate,
            currently_checked_in_guests,
            recent_activities,
        }
    }
}
