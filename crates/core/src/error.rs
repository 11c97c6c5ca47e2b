use thiserror::Error;
use tt_types::{ClockTime, CourseCode, DayOfWeek, RoomCategory};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("slot duration must be positive")]
    ZeroSlotDuration,
    #[error("time domain is empty: no schedulable slot between {start} and {end} on the configured days")]
    EmptyDomain { start: ClockTime, end: ClockTime },
    #[error("course {course} needs {hours} h/week, not a multiple of the {slot_minutes}-minute slot")]
    IndivisibleHours {
        course: CourseCode,
        hours: f64,
        slot_minutes: u16,
    },
    #[error("objective weight {name} is negative ({value})")]
    NegativeWeight { name: &'static str, value: f64 },
    #[error("objective weights sum to {sum}, expected {expected}")]
    WeightsNotNormalized { sum: f64, expected: f64 },
    #[error("optimality gap must lie in [0, 1), got {0}")]
    InvalidGap(f64),
    #[error("reserve ratio must lie in [0, 1], got {0}")]
    InvalidReserveRatio(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("room {room} is malformed: {reason}")]
    MalformedRoom { room: String, reason: String },
    #[error("course {0} has no contact hours")]
    NoContactHours(CourseCode),
    #[error("class {class} has no eligible room (needs {category}, {enrollment} seats)")]
    NoEligibleRoom {
        class: String,
        category: RoomCategory,
        enrollment: u32,
    },
    #[error("fixed booking names unknown room {0}")]
    UnknownRoom(String),
    #[error("fixed booking names unknown block {0}")]
    UnknownBlock(String),
    #[error("fixed booking of room {room} on {day:?} {start}-{end} covers no slot of the time domain")]
    BookingOutsideDomain {
        room: String,
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
    },
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid instance: {}", .0.join("; "))]
pub struct ValidationError(pub Vec<String>);

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("backend failed on {scope}: {message}")]
    Backend { scope: String, message: String },
    #[error("backend assignment for {scope} violates {count} constraint(s), first: {first}")]
    BackendContract {
        scope: String,
        count: usize,
        first: String,
    },
}
