use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Currency amount in the property's base unit (e.g. dollars).
pub type Money = f64;

/// Half-open stay interval `[check_in, check_out)` in hotel dates.
///
/// Half-open semantics make same-day turnover legal: a stay ending on a date
/// and another starting on that date do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "StayRange check_in must be before check_out");
        Self { check_in, check_out }
    }

    /// Number of nights covered by the range. Positive for any valid range.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains_date(&self, d: NaiveDate) -> bool {
        self.check_in <= d && d < self.check_out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "Available"),
            RoomStatus::Occupied => write!(f, "Occupied"),
            RoomStatus::Maintenance => write!(f, "Maintenance"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    #[serde(rename = "Checked-In")]
    CheckedIn,
    #[serde(rename = "Checked-Out")]
    CheckedOut,
    Cancelled,
}

impl ReservationStatus {
    /// Reserved and Checked-In reservations hold the room; terminal states do not.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved | ReservationStatus::CheckedIn)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::CheckedOut | ReservationStatus::Cancelled)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Reserved => write!(f, "Reserved"),
            ReservationStatus::CheckedIn => write!(f, "Checked-In"),
            ReservationStatus::CheckedOut => write!(f, "Checked-Out"),
            ReservationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Ulid,
    pub number: u32,
    #[serde(rename = "type")]
    pub room_type: String,
    pub price_per_night: Money,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Ulid,
    pub room_id: Ulid,
    pub guest_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub actual_check_in: Option<DateTime<Utc>>,
    pub actual_check_out: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn stay(&self) -> StayRange {
        StayRange::new(self.check_in, self.check_out)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Staff => write!(f, "STAFF"),
        }
    }
}

/// A front-desk account. The password hash is an opaque `salt$digest` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Ulid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Per-room state: the room record plus every reservation ever made for it,
/// sorted by `check_in`. Cancelled and checked-out reservations stay in the
/// list as history; only active ones participate in conflict checks.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    pub reservations: Vec<Reservation>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            reservations: Vec::new(),
        }
    }

    /// Insert a reservation maintaining sort order by check_in.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.check_in, |r| r.check_in)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub fn reservation(&self, id: Ulid) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn reservation_mut(&mut self, id: Ulid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Return only reservations whose stay overlaps the query range.
    /// Uses binary search to skip reservations starting at or after `query.check_out`.
    pub fn overlapping(&self, query: &StayRange) -> impl Iterator<Item = &Reservation> {
        // Everything at index >= right_bound checks in at or after query.check_out → can't overlap.
        let right_bound = self
            .reservations
            .partition_point(|r| r.check_in < query.check_out);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.check_out > query.check_in)
    }

    /// Count active reservations, optionally excluding one id.
    pub fn active_count(&self, exclude: Option<Ulid>) -> usize {
        self.reservations
            .iter()
            .filter(|r| r.is_active() && Some(r.id) != exclude)
            .count()
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
///
/// Reservation transition events carry the resulting room status so that a
/// transition and its occupancy side effect are one record: either both are
/// durable or neither is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        room: Room,
    },
    RoomUpdated {
        id: Ulid,
        number: u32,
        room_type: String,
        price_per_night: Money,
        status: RoomStatus,
    },
    RoomDeleted {
        id: Ulid,
    },
    ReservationCreated {
        reservation: Reservation,
    },
    ReservationCheckedIn {
        id: Ulid,
        room_id: Ulid,
        at: DateTime<Utc>,
        total_amount: Money,
        room_status: RoomStatus,
    },
    ReservationCheckedOut {
        id: Ulid,
        room_id: Ulid,
        at: DateTime<Utc>,
        total_amount: Money,
        room_status: RoomStatus,
    },
    ReservationCancelled {
        id: Ulid,
        room_id: Ulid,
        room_status: RoomStatus,
    },
    StaffCreated {
        staff: StaffMember,
    },
    StaffDeleted {
        id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

/// Room fields exposed when a reservation's room reference is expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub id: Ulid,
    pub number: u32,
    #[serde(rename = "type")]
    pub room_type: String,
    pub price_per_night: Money,
}

impl RoomRef {
    pub fn of(room: &Room) -> Self {
        Self {
            id: room.id,
            number: room.number,
            room_type: room.room_type.clone(),
            price_per_night: room.price_per_night,
        }
    }
}

/// A reservation with its room reference resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub room: RoomRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffInfo {
    pub id: Ulid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_rooms: usize,
    pub active_reservations: usize,
    pub staff_members: usize,
    pub occupancy_rate: f64,
    pub currently_checked_in_guests: usize,
    pub recent_activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Ulid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn reservation(check_in: &str, check_out: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: Ulid::new(),
            room_id: Ulid::new(),
            guest_name: "Ada Lovelace".into(),
            guest_phone: None,
            check_in: d(check_in),
            check_out: d(check_out),
            actual_check_in: None,
            actual_check_out: None,
            status,
            total_amount: 0.0,
            created_at: Utc::now(),
        }
    }

    fn room() -> Room {
        Room {
            id: Ulid::new(),
            number: 101,
            room_type: "Single".into(),
            price_per_night: 100.0,
            status: RoomStatus::Available,
        }
    }

    #[test]
    fn stay_range_nights() {
        let r = StayRange::new(d("2024-06-01"), d("2024-06-05"));
        assert_eq!(r.nights(), 4);
        assert!(r.contains_date(d("2024-06-01")));
        assert!(r.contains_date(d("2024-06-04")));
        assert!(!r.contains_date(d("2024-06-05"))); // half-open
    }

    #[test]
    fn stay_range_overlap() {
        let a = StayRange::new(d("2024-06-01"), d("2024-06-05"));
        let b = StayRange::new(d("2024-06-03"), d("2024-06-07"));
        let c = StayRange::new(d("2024-06-05"), d("2024-06-08"));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn stay_range_enclosing_overlaps() {
        let outer = StayRange::new(d("2024-06-01"), d("2024-06-10"));
        let inner = StayRange::new(d("2024-06-04"), d("2024-06-05"));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn reservation_ordering() {
        let mut rs = RoomState::new(room());
        rs.insert_reservation(reservation("2024-06-20", "2024-06-25", ReservationStatus::Reserved));
        rs.insert_reservation(reservation("2024-06-01", "2024-06-05", ReservationStatus::Reserved));
        rs.insert_reservation(reservation("2024-06-10", "2024-06-12", ReservationStatus::Reserved));
        assert_eq!(rs.reservations[0].check_in, d("2024-06-01"));
        assert_eq!(rs.reservations[1].check_in, d("2024-06-10"));
        assert_eq!(rs.reservations[2].check_in, d("2024-06-20"));
    }

    #[test]
    fn overlapping_skips_disjoint() {
        let mut rs = RoomState::new(room());
        rs.insert_reservation(reservation("2024-05-01", "2024-05-03", ReservationStatus::Reserved));
        rs.insert_reservation(reservation("2024-06-02", "2024-06-06", ReservationStatus::Reserved));
        rs.insert_reservation(reservation("2024-07-01", "2024-07-05", ReservationStatus::Reserved));

        let query = StayRange::new(d("2024-06-01"), d("2024-06-10"));
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].check_in, d("2024-06-02"));
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        // A stay ending exactly at query.check_in is NOT overlapping (half-open)
        let mut rs = RoomState::new(room());
        rs.insert_reservation(reservation("2024-06-01", "2024-06-05", ReservationStatus::Reserved));
        let query = StayRange::new(d("2024-06-05"), d("2024-06-08"));
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn overlapping_enclosing_stay_found() {
        let mut rs = RoomState::new(room());
        rs.insert_reservation(reservation("2024-06-01", "2024-06-30", ReservationStatus::Reserved));
        let query = StayRange::new(d("2024-06-10"), d("2024-06-11"));
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn active_count_excludes_terminal_and_excluded() {
        let mut rs = RoomState::new(room());
        let a = reservation("2024-06-01", "2024-06-05", ReservationStatus::Reserved);
        let a_id = a.id;
        rs.insert_reservation(a);
        rs.insert_reservation(reservation("2024-06-10", "2024-06-12", ReservationStatus::CheckedIn));
        rs.insert_reservation(reservation("2024-06-20", "2024-06-22", ReservationStatus::Cancelled));
        rs.insert_reservation(reservation("2024-05-01", "2024-05-03", ReservationStatus::CheckedOut));

        assert_eq!(rs.active_count(None), 2);
        assert_eq!(rs.active_count(Some(a_id)), 1);
    }

    #[test]
    fn status_json_strings() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::CheckedIn).unwrap(),
            "\"Checked-In\""
        );
        assert_eq!(
            serde_json::to_string(&ReservationStatus::CheckedOut).unwrap(),
            "\"Checked-Out\""
        );
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let parsed: ReservationStatus = serde_json::from_str("\"Checked-In\"").unwrap();
        assert_eq!(parsed, ReservationStatus::CheckedIn);
    }

    #[test]
    fn room_json_uses_type_field() {
        let r = room();
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("pricePerNight").is_some());
        assert!(json.get("room_type").is_none());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::ReservationCreated {
            reservation: Reservation {
                id: Ulid::new(),
                room_id: Ulid::new(),
                guest_name: "Grace Hopper".into(),
                guest_phone: Some("555-0100".into()),
                check_in: "2024-06-01".parse().unwrap(),
                check_out: "2024-06-04".parse().unwrap(),
                actual_check_in: None,
                actual_check_out: None,
                status: ReservationStatus::Reserved,
                total_amount: 300.0,
                created_at: Utc::now(),
            },
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
