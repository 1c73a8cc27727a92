//! Hard limits enforced by the engine. Inputs past these bounds are rejected
//! with `EngineError::LimitExceeded` before any state is touched.

pub const MAX_ROOMS: usize = 10_000;
pub const MAX_RESERVATIONS_PER_ROOM: usize = 50_000;
pub const MAX_STAFF: usize = 1_000;
pub const MAX_SESSIONS: usize = 10_000;

pub const MAX_ROOM_TYPE_LEN: usize = 64;
pub const MAX_GUEST_NAME_LEN: usize = 256;
pub const MAX_GUEST_PHONE_LEN: usize = 64;
pub const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest bookable stay.
pub const MAX_STAY_NIGHTS: i64 = 1_000;

/// Stay dates must fall inside this year window.
pub const EARLIEST_STAY_YEAR: i32 = 2000;
pub const LATEST_STAY_YEAR: i32 = 2200;
